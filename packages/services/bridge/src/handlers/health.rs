//! 헬스 체크

use axum::Json;
use serde_json::Value;

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({ "ok": true }))
}
