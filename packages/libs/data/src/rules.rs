//! 저장 전 검증 규칙 평가
//!
//! 기본값 해석이 끝난 레코드에 대해 실행 직전에 평가합니다.
//! 위반은 모두 모아 한 번에 `Error::RuleViolation`으로 돌려줍니다.

use std::collections::BTreeMap;

use mcrud_core::schema::{ColumnType, QueryType, RuleMode, TableMeta, ValidationRule};
use mcrud_core::{Error, Record, Result, Value};
use mcrud_sql::condition::{compile, literal, ColumnSpec};
use mcrud_sql::{coerce, guard, CompiledCondition, CountRequest};

use crate::store::DataStore;

/// 규칙 평가
///
/// `current_id`는 update 대상의 기본 키이며, 같은 테이블 조회에서 자기 자신을 제외합니다.
pub async fn check_rules(
    store: &dyn DataStore,
    meta: &TableMeta,
    record: &Record,
    current_id: Option<&Value>,
) -> Result<()> {
    let mut messages = Vec::new();

    for rule in &meta.rules {
        if !evaluate(store, meta, rule, record, current_id).await? {
            tracing::debug!(table = %meta.table, column = %rule.check_column, "validation rule failed");
            messages.push(rule.message());
        }
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::RuleViolation { messages })
    }
}

/// 규칙 하나 평가 (true = 통과)
async fn evaluate(
    store: &dyn DataStore,
    meta: &TableMeta,
    rule: &ValidationRule,
    record: &Record,
    current_id: Option<&Value>,
) -> Result<bool> {
    let columns = rule.columns();
    let values: Vec<&Value> = columns
        .iter()
        .filter_map(|c| record.get(*c).filter(|v| !v.is_empty()))
        .collect();

    // 값이 하나라도 비어있으면 건너뜀
    if columns.is_empty() || values.len() != columns.len() {
        return Ok(true);
    }

    match &rule.mode {
        RuleMode::Range { min, max } => {
            let Some(n) = values[0].as_f64() else {
                return Ok(false);
            };
            Ok(min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m))
        }
        RuleMode::NotExists | RuleMode::MultiRepeat => {
            let found = count_matches(store, meta, rule, &columns, &values, current_id).await?;
            Ok(found == 0)
        }
        RuleMode::Exists => {
            let found = count_matches(store, meta, rule, &columns, &values, None).await?;
            Ok(found > 0)
        }
    }
}

async fn count_matches(
    store: &dyn DataStore,
    meta: &TableMeta,
    rule: &ValidationRule,
    columns: &[&str],
    values: &[&Value],
    current_id: Option<&Value>,
) -> Result<u64> {
    let target = rule
        .target_table
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(&meta.table)
        .to_lowercase();
    guard::check_table(&target)?;

    let same_table = target == meta.table;
    let mut coerced = BTreeMap::new();
    let mut specs = Vec::new();

    for (column, value) in columns.iter().zip(values) {
        guard::check_column(column)?;

        let column_type = if same_table {
            meta.column(column).map(|c| c.column_type).unwrap_or_default()
        } else {
            ColumnType::String
        };
        coerced.insert(column.to_string(), coerce(value, QueryType::Eq));
        specs.push(ColumnSpec::new(*column, QueryType::Eq).with_column_type(column_type));
    }

    let mut condition = compile(&target, &coerced, &specs, true);

    if let (true, Some(id)) = (same_table, current_id.filter(|v| !v.is_empty())) {
        let pk = meta.primary_key();
        let exclude = format!(
            "{}.{} != {}",
            target,
            pk,
            literal(&coerce(id, QueryType::Eq), ColumnType::Number)
        );
        condition = CompiledCondition {
            sql: if condition.is_empty() {
                exclude
            } else {
                format!("{} AND {}", condition.sql, exclude)
            },
            ..condition
        };
    }

    store
        .count(&CountRequest {
            table: target,
            join: None,
            condition,
        })
        .await
}
