//! Bridge 미들웨어
//!
//! 요청 ID 부여와 상위 게이트웨이가 넘겨준 사용자 컨텍스트 헤더 해석을 담당합니다.
//! 토큰 검증은 하지 않습니다. 헤더는 신뢰된 상위 계층에서 채운다고 가정합니다.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use mcrud_core::{UserContext, Value};

use crate::error::{BridgeError, Result};

tokio::task_local! {
    static REQUEST_ID: String;
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

pub async fn request_id(req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut resp = REQUEST_ID.scope(id.clone(), async move { next.run(req).await }).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}

/// 헤더에서 사용자 컨텍스트 추출
///
/// - `x-user-context`: JSON 객체 (나머지 헤더보다 먼저 적용)
/// - `x-user-id`, `x-username`, `x-org-id`, `x-tenant-id`
/// - `x-user-roles`: 콤마 구분
///
/// `enabled_fields`가 있으면 그 밖의 추가 필드는 조회되지 않습니다.
pub fn user_context(headers: &HeaderMap, enabled_fields: Option<&[String]>) -> Result<UserContext> {
    let mut ctx = match header(headers, "x-user-context") {
        Some(raw) => serde_json::from_str::<UserContext>(&raw)
            .map_err(|e| BridgeError::bad_request(format!("Invalid x-user-context: {}", e)))?,
        None => UserContext::anonymous(),
    };

    if let Some(id) = header(headers, "x-user-id") {
        ctx.user_id = Some(scalar(id));
    }
    if let Some(name) = header(headers, "x-username") {
        ctx.username = Some(name);
    }
    if let Some(org) = header(headers, "x-org-id") {
        ctx.org_id = Some(scalar(org));
    }
    if let Some(tenant) = header(headers, "x-tenant-id") {
        ctx.tenant_id = Some(scalar(tenant));
    }
    if let Some(roles) = header(headers, "x-user-roles") {
        ctx.roles = roles
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(fields) = enabled_fields {
        ctx = ctx.with_enabled_fields(fields.iter().cloned());
    }

    Ok(ctx)
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 숫자로 보이는 ID는 정수로
fn scalar(raw: String) -> Value {
    match raw.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::Text(raw),
    }
}
