//! HTTP 핸들러

pub mod common;
pub mod health;
pub mod meta;
