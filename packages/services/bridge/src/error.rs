//! Bridge 에러 타입

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Bridge 에러
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("core error: {0}")]
    Core(#[from] mcrud_core::Error),
}

impl BridgeError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        BridgeError::BadRequest {
            message: message.into(),
        }
    }
}

/// 에러 응답 JSON
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl BridgeError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            BridgeError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", message.clone())
            }
            BridgeError::Core(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, e.code(), e.to_string())
            }
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                request_id: crate::middleware::current_request_id(),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_status_and_code() {
        let err = BridgeError::from(mcrud_core::Error::required("title"));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("[title]"));

        let err = BridgeError::from(mcrud_core::Error::execution("duplicate key"));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "EXECUTION_ERROR");
        assert_eq!(message, "operation failed: duplicate key");
    }

    #[test]
    fn test_response_status() {
        let resp = BridgeError::bad_request("missing targetTable").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = BridgeError::from(mcrud_core::Error::unsafe_expression("sort", "1; --"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
