//! 테이블/컬럼 메타데이터 타입
//!
//! # 개요
//!
//! 동적 CRUD 대상 테이블은 컴파일 타임 스키마가 없습니다.
//! 대신 카탈로그(`table_attribute`, `column_attribute`)의 행을
//! 이 모듈의 타입으로 읽어 쿼리/저장 동작을 결정합니다.
//!
//! # 모듈 구조
//!
//! - `types`: 쿼리 타입, 컬럼 타입
//! - `column`: 컬럼 정의, 감사 컬럼 목록
//! - `table`: 테이블 기본 설정, 테이블 메타
//! - `rule`: 저장 전 검증 규칙

mod column;
mod rule;
mod table;
mod types;

pub use column::{is_audit_column, ColumnDefinition, AUDIT_COLUMNS};
pub use rule::{RuleMode, ValidationRule};
pub use table::{TableDefaults, TableMeta};
pub use types::{ColumnType, QueryType};
