//! mcrud-core: 메타데이터 기반 CRUD 공통 핵심 라이브러리
//!
//! 이 크레이트는 SQL 생성 계층, 데이터 접근 계층, Bridge 서비스가 공유하는
//! 핵심 타입과 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `value`: 동적 값 모델 (요청 파라미터, 쓰기 레코드, 조회 Row)
//! - `context`: 호출자 사용자 컨텍스트
//! - `schema`: 테이블/컬럼 메타데이터 타입
//! - `catalog`: 메타데이터 카탈로그 (캐시, 저장소 트레이트)
//! - `defaults`: 기본값 / 감사 필드 해석
//! - `error`: 공통 에러 타입

pub mod catalog;
pub mod context;
pub mod defaults;
pub mod error;
pub mod schema;
pub mod value;

pub use catalog::{MetadataCatalog, MetadataSource, StaticSource};
pub use context::UserContext;
pub use defaults::{DefaultExpr, DefaultResolver};
pub use error::{Error, Result};
pub use value::{Params, Record, Row, Value};
