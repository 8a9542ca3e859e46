//! /api/meta 핸들러

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

/// refresh 쿼리 (`table`이 없으면 전체 무효화)
#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    pub table: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub invalidated: usize,
}

/// POST /api/meta/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<RefreshResponse>> {
    let catalog = state.catalog();
    let invalidated = match query.table.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(table) => usize::from(catalog.invalidate(table)),
        None => catalog.invalidate_all(),
    };

    tracing::info!(table = ?query.table, invalidated, "metadata cache refreshed");
    Ok(Json(RefreshResponse { invalidated }))
}
