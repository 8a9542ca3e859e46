//! mcrud-sql: 메타데이터 기반 동적 SQL 생성 라이브러리
//!
//! 테이블 메타데이터와 느슨한 타입의 파라미터 맵으로
//! WHERE 조건과 CRUD 문장을 런타임에 생성합니다.
//!
//! # 모듈 구조
//!
//! - `params`: 요청 파라미터 해석 (예약 키, 접미사, 페이지)
//! - `coerce`: 쿼리 타입별 값 변환
//! - `condition`: WHERE 조건 컴파일러
//! - `filters`: 검색 플래그 기반 암묵 필터
//! - `guard`: 식별자 / 표현식 검증
//! - `builder`: CRUD SQL 빌더

pub mod builder;
pub mod coerce;
pub mod condition;
pub mod filters;
pub mod guard;
pub mod params;

pub use builder::{CountRequest, DeleteRequest, InsertRequest, SelectRequest, UpdateRequest};
pub use coerce::coerce;
pub use condition::{compile, compile_params, ColumnSpec, CompiledCondition, Joiner};
pub use filters::enhance_filters;
pub use params::Pagination;
