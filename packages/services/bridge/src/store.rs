//! Postgres 실행 계층
//!
//! 생성된 SQL을 sqlx 풀에서 실행합니다. 쓰기는 호출마다 하나의 트랜잭션으로 묶습니다.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row as _, TypeInfo};

use mcrud_core::{Error, Result, Row, Value};
use mcrud_data::DataStore;
use mcrud_sql::{CountRequest, DeleteRequest, InsertRequest, SelectRequest, UpdateRequest};

/// sqlx 기반 저장소
pub struct PgStore {
    pool: PgPool,
    timeout: Option<Duration>,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Option<Duration>) -> Self {
        Self { pool, timeout }
    }

    /// 타임아웃 적용
    async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::execution(format!("query timed out after {}s", limit.as_secs())))?,
            None => fut.await,
        };
        result.map_err(Error::execution)
    }

    /// 트랜잭션 안에서 하나의 문장 실행, 영향받은 행 수 반환
    async fn execute(&self, sql: String) -> Result<u64> {
        tracing::debug!(sql = %sql, "execute");
        self.run(async {
            let mut tx = self.pool.begin().await?;
            let done = sqlx::query(&sql).execute(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(done.rows_affected())
        })
        .await
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>> {
        let sql = request.to_sql();
        tracing::debug!(sql = %sql, "select");
        let rows = self.run(sqlx::query(&sql).fetch_all(&self.pool)).await?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self, request: &CountRequest) -> Result<u64> {
        let sql = request.to_sql();
        tracing::debug!(sql = %sql, "count");
        let total: i64 = self
            .run(sqlx::query_scalar(&sql).fetch_one(&self.pool))
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn insert(&self, request: &InsertRequest) -> Result<Option<Value>> {
        let sql = request.to_sql()?;
        tracing::debug!(sql = %sql, "insert");
        let row = self
            .run(async {
                let mut tx = self.pool.begin().await?;
                let row = sqlx::query(&sql).fetch_optional(&mut *tx).await?;
                tx.commit().await?;
                Ok::<_, sqlx::Error>(row)
            })
            .await?;

        Ok(row
            .filter(|r| !r.columns().is_empty())
            .map(|r| cell(&r, 0))
            .filter(|v| !v.is_empty()))
    }

    async fn insert_batch(&self, request: &InsertRequest) -> Result<u64> {
        self.execute(request.to_sql()?).await
    }

    async fn update(&self, request: &UpdateRequest) -> Result<u64> {
        self.execute(request.to_sql()).await
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<u64> {
        self.execute(request.to_sql()).await
    }
}

/// PgRow → Row
fn row_to_record(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .map(|column| (column.name().to_string(), cell(row, column.ordinal())))
        .collect()
}

/// 컬럼 타입 이름에 따라 값 디코딩 (알 수 없는 타입은 텍스트 시도, 실패하면 Null)
fn cell(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Int(v.into())),
        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Int(v.into())),
        "INT8" | "BIGINT" => row.try_get::<Option<i64>, _>(idx).ok().flatten().map(Value::Int),
        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Float(v.into())),
        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Float),
        "BOOL" | "BOOLEAN" => row.try_get::<Option<bool>, _>(idx).ok().flatten().map(Value::Bool),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Text(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .ok()
            .flatten()
            .map(Value::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Timestamp(v.and_utc())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .ok()
            .flatten()
            .map(|v| Value::Text(v.to_string())),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(idx)
            .ok()
            .flatten()
            .map(Value::from),
        _ => row.try_get::<Option<String>, _>(idx).ok().flatten().map(Value::Text),
    };
    value.unwrap_or(Value::Null)
}
