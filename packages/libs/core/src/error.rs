//! 공통 에러 타입
//!
//! mcrud 전체에서 사용되는 에러 타입을 정의합니다.
//! 알 수 없는 컬럼은 에러가 아니라 `tracing::warn!` 이벤트로만 남깁니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// mcrud 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("field [{field}] is required: {message}")]
    Validation { field: String, message: String },

    #[error("validation rules failed: {}", messages.join("; "))]
    RuleViolation { messages: Vec<String> },

    #[error("unsafe {kind}: {expression}")]
    UnsafeExpression { kind: String, expression: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Catalog Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("metadata unavailable for table '{table}': {message}")]
    MetadataUnavailable { table: String, message: String },

    #[error("catalog file error: {message}")]
    CatalogFile { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("operation failed: {message}")]
    Execution { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // IO/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 필수 필드 누락 에러 생성
    pub fn required(field: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: "no value, context field or default available".to_string(),
        }
    }

    /// 실행 단계 에러 생성
    pub fn execution(message: impl ToString) -> Self {
        Error::Execution {
            message: message.to_string(),
        }
    }

    /// 안전하지 않은 식별자/표현식 에러 생성
    pub fn unsafe_expression(kind: &str, expression: impl Into<String>) -> Self {
        Error::UnsafeExpression {
            kind: kind.to_string(),
            expression: expression.into(),
        }
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Validation { .. }
            | Error::RuleViolation { .. }
            | Error::UnsafeExpression { .. }
            | Error::Yaml(_)
            | Error::Json(_) => 400,

            // 503 Service Unavailable
            Error::MetadataUnavailable { .. } => 503,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::RuleViolation { .. } => "RULE_VIOLATION",
            Error::UnsafeExpression { .. } => "UNSAFE_EXPRESSION",
            Error::MetadataUnavailable { .. } => "METADATA_UNAVAILABLE",
            Error::CatalogFile { .. } => "CATALOG_FILE_ERROR",
            Error::Execution { .. } => "EXECUTION_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
