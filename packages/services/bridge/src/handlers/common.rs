//! /api/common 핸들러
//!
//! 테이블 이름은 `targetTable` 쿼리 파라미터로 받습니다.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use mcrud_core::{Params, Record, Row, UserContext, Value};
use mcrud_data::ListQuery;

use crate::error::{BridgeError, Result};
use crate::middleware;
use crate::state::AppState;

/// `targetTable` 쿼리
#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    #[serde(rename = "targetTable")]
    pub target_table: Option<String>,
}

impl TargetQuery {
    fn table(&self) -> Result<&str> {
        self.target_table
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BridgeError::bad_request("targetTable is required"))
    }
}

/// 목록 응답
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<JsonValue>,
    pub total: u64,
}

/// 쓰기 응답
#[derive(Debug, Default, Serialize)]
pub struct WriteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonValue>,
    pub affected: u64,
}

/// delete 요청 본문
#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    pub id: JsonValue,
}

/// batchDelete 요청 본문
#[derive(Debug, Deserialize)]
pub struct BatchDeleteBody {
    pub ids: Vec<JsonValue>,
}

/// GET /api/common/list
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse>> {
    let ctx = context(&state, &headers)?;
    let table = query
        .get("targetTable")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BridgeError::bad_request("targetTable is required"))?;

    let params: Params = query
        .into_iter()
        .map(|(k, v)| (k, Value::Text(v)))
        .collect();
    let list_query = ListQuery::from_params(params);

    let rows = state.service.query_list(&ctx, &table, &list_query).await?;
    let total = state
        .service
        .count(&ctx, &table, &list_query.params, list_query.join.as_deref())
        .await?;

    Ok(Json(ListResponse {
        items: rows.iter().map(row_to_json).collect(),
        total,
    }))
}

/// POST /api/common/save
///
/// 양수 기본 키가 있으면 update, 없으면 insert.
pub async fn save(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(target): Query<TargetQuery>,
    Json(body): Json<JsonValue>,
) -> Result<Json<WriteResponse>> {
    let ctx = context(&state, &headers)?;
    let table = target.table()?;
    let record = record_from_json(body)?;

    let meta = state.catalog().table(table).await;
    match existing_id(&record, meta.primary_key()) {
        Some(id) => {
            let affected = state.service.update(&ctx, table, record, id.clone()).await?;
            Ok(Json(WriteResponse {
                id: Some(id.to_json()),
                affected,
            }))
        }
        None => {
            let id = state.service.save(&ctx, table, record).await?;
            Ok(Json(WriteResponse {
                id: id.map(|v| v.to_json()),
                affected: 1,
            }))
        }
    }
}

/// POST /api/common/batchSave
pub async fn batch_save(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(target): Query<TargetQuery>,
    Json(body): Json<Vec<JsonValue>>,
) -> Result<Json<WriteResponse>> {
    let ctx = context(&state, &headers)?;
    let table = target.table()?;
    let records = body
        .into_iter()
        .map(record_from_json)
        .collect::<Result<Vec<Record>>>()?;

    let affected = state.service.save_batch(&ctx, table, records).await?;
    Ok(Json(WriteResponse {
        affected,
        ..Default::default()
    }))
}

/// POST /api/common/delete
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Query(target): Query<TargetQuery>,
    Json(body): Json<DeleteBody>,
) -> Result<Json<WriteResponse>> {
    let table = target.table()?;
    let id = Value::from(body.id);
    if id.is_empty() {
        return Err(BridgeError::bad_request("id is required"));
    }

    let affected = state.service.delete(table, id).await?;
    Ok(Json(WriteResponse {
        affected,
        ..Default::default()
    }))
}

/// POST /api/common/batchDelete
pub async fn batch_delete(
    State(state): State<Arc<AppState>>,
    Query(target): Query<TargetQuery>,
    Json(body): Json<BatchDeleteBody>,
) -> Result<Json<WriteResponse>> {
    let table = target.table()?;
    let ids = body.ids.into_iter().map(Value::from).collect();

    let affected = state.service.delete_batch(table, ids).await?;
    Ok(Json(WriteResponse {
        affected,
        ..Default::default()
    }))
}

fn context(state: &AppState, headers: &HeaderMap) -> Result<UserContext> {
    if state.config.disable_context {
        return Ok(UserContext::anonymous());
    }
    middleware::user_context(headers, state.config.context_fields.as_deref())
}

fn record_from_json(body: JsonValue) -> Result<Record> {
    match body {
        JsonValue::Object(obj) => Ok(Value::map_from_json(obj)),
        _ => Err(BridgeError::bad_request("record must be a JSON object")),
    }
}

/// 기존 행을 가리키는 기본 키 (양수 정수 또는 비어있지 않은 문자열 ID)
fn existing_id(record: &Record, primary_key: &str) -> Option<Value> {
    let id = record.get(primary_key)?;
    match id.as_i64() {
        Some(n) if n > 0 => Some(id.clone()),
        Some(_) => None,
        None => match id {
            Value::Text(s) if !s.trim().is_empty() => Some(id.clone()),
            _ => None,
        },
    }
}

fn row_to_json(row: &Row) -> JsonValue {
    JsonValue::Object(row.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}
