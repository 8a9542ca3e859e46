//! mcrud-data: 범용 데이터 접근 계층
//!
//! 임의의 테이블 이름에 대해 목록/건수/저장/수정/삭제를 제공하는 파사드입니다.
//!
//! # 모듈 구조
//!
//! - `service`: `DataService` 파사드, 목록 조회 요청
//! - `store`: 실행 계층 트레이트 (`DataStore`)
//! - `rules`: 저장 전 검증 규칙 평가

pub mod rules;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use service::{DataService, ListQuery};
pub use store::DataStore;
