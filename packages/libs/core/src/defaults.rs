//! 기본값 / 감사 필드 해석
//!
//! 저장/수정 레코드의 빈 필드를 다음 순서로 채웁니다.
//!
//! 1. 호출자가 준 비어있지 않은 값 (항상 우선)
//! 2. `edit_flag` 컬럼이면 사용자 컨텍스트의 같은 키
//! 3. 기본값 표현식 (`now()`, `uuid()`, `userId()`, `username()`, `orgId()` 또는 리터럴)
//! 4. 컬럼 타입 기반 기본값 (insert에서 필수가 아닌 컬럼만)
//!
//! 감사 컬럼은 위 순서와 별도로 컨텍스트/현재 시각에서 채우며,
//! 호출자가 준 값은 덮어쓰지 않습니다.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::context::UserContext;
use crate::error::{Error, Result};
use crate::schema::{is_audit_column, ColumnDefinition, TableMeta};
use crate::value::{Record, Value};

/// 기본값 표현식
///
/// 함수 토큰은 대소문자를 무시한 문자열 비교로 인식합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultExpr {
    Now,
    Uuid,
    UserId,
    Username,
    OrgId,
    Literal(String),
}

impl DefaultExpr {
    /// 표현식 파싱
    pub fn parse(expr: &str) -> Self {
        let trimmed = expr.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "now()" | "current_timestamp" => DefaultExpr::Now,
            "uuid()" => DefaultExpr::Uuid,
            "userid()" => DefaultExpr::UserId,
            "username()" => DefaultExpr::Username,
            "orgid()" => DefaultExpr::OrgId,
            _ => DefaultExpr::Literal(trimmed.to_string()),
        }
    }

    /// 표현식 평가
    ///
    /// 컨텍스트 토큰인데 컨텍스트에 값이 없으면 `None`입니다.
    pub fn evaluate(&self, ctx: &UserContext, now: DateTime<Utc>) -> Option<Value> {
        match self {
            DefaultExpr::Now => Some(Value::Timestamp(now)),
            DefaultExpr::Uuid => Some(Value::Text(Uuid::new_v4().to_string())),
            DefaultExpr::UserId => ctx.get("userId"),
            DefaultExpr::Username => ctx.get("username"),
            DefaultExpr::OrgId => ctx.get("orgId"),
            DefaultExpr::Literal(s) => Some(literal_value(s)),
        }
    }
}

/// 정수처럼 보이는 리터럴은 정수로 변환
fn literal_value(s: &str) -> Value {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Int(i);
        }
    }
    Value::Text(s.to_string())
}

/// 작업 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Insert,
    Update,
}

/// 감사 컬럼 값 (insert 전용 컬럼은 update에서 `None`)
fn audit_value(column: &str, kind: WriteKind, ctx: &UserContext, now: DateTime<Utc>) -> Option<Value> {
    match (column, kind) {
        ("update_by", _) => ctx.get("userId"),
        ("updated_at" | "updated_time" | "update_time", _) => Some(Value::Timestamp(now)),
        ("updater", _) => ctx.get("username"),
        (_, WriteKind::Update) => None,
        ("create_by", WriteKind::Insert) => ctx.get("userId"),
        ("created_at" | "created_time" | "create_time", WriteKind::Insert) => {
            Some(Value::Timestamp(now))
        }
        ("creator", WriteKind::Insert) => ctx.get("username"),
        ("org_id", WriteKind::Insert) => ctx.get("orgId"),
        ("tenant_id", WriteKind::Insert) => ctx.get("tenantId"),
        _ => None,
    }
}

fn has_value(record: &Record, key: &str) -> bool {
    record.get(key).is_some_and(|v| !v.is_empty())
}

/// 기본값 / 감사 필드 해석기
///
/// 한 번의 쓰기 호출 동안 테이블 메타와 사용자 컨텍스트를 빌려 씁니다.
pub struct DefaultResolver<'a> {
    meta: &'a TableMeta,
    ctx: &'a UserContext,
    now: DateTime<Utc>,
}

impl<'a> DefaultResolver<'a> {
    /// 새 해석기 생성
    pub fn new(meta: &'a TableMeta, ctx: &'a UserContext) -> Self {
        Self {
            meta,
            ctx,
            now: Utc::now(),
        }
    }

    /// 현재 시각 고정 (테스트용)
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// insert 레코드 해석
    pub fn resolve_for_insert(&self, record: &mut Record) -> Result<()> {
        let pk = self.meta.primary_key();
        if record.get(pk).is_some_and(Value::is_empty) {
            record.remove(pk);
        }

        self.drop_unknown_fields(record);

        for column in &self.meta.columns {
            if column.is_audit() {
                self.stamp_audit(column, WriteKind::Insert, record);
            } else {
                self.fill_from_sources(column, record);
            }
        }

        self.check_required(record, |_| true)?;

        // 빈 기본 키는 저장소가 채움
        for column in &self.meta.columns {
            if column.is_audit()
                || column.required
                || column.column_name == pk
                || has_value(record, &column.column_name)
            {
                continue;
            }
            record.insert(column.column_name.clone(), column.column_type.fallback_value());
        }

        Ok(())
    }

    /// update 레코드 해석
    ///
    /// 레코드에 있는 컬럼만 채우고 수정 감사 컬럼을 찍습니다.
    pub fn resolve_for_update(&self, record: &mut Record) -> Result<()> {
        self.drop_unknown_fields(record);

        for column in &self.meta.columns {
            if column.is_audit() {
                self.stamp_audit(column, WriteKind::Update, record);
            } else if record.contains_key(&column.column_name) {
                self.fill_from_sources(column, record);
            }
        }

        let present: &Record = record;
        self.check_required(present, |name| present.contains_key(name))
    }

    /// 배치 insert 해석
    ///
    /// 레코드별 해석 후 전체 키 합집합으로 빠진 컬럼을 채워 컬럼 집합을 맞춥니다.
    pub fn resolve_batch(&self, records: &mut [Record]) -> Result<()> {
        for record in records.iter_mut() {
            self.resolve_for_insert(record)?;
        }

        let keys: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.keys().cloned())
            .collect();

        for record in records.iter_mut() {
            for key in &keys {
                if record.contains_key(key) || key == self.meta.primary_key() {
                    continue;
                }
                let value = self.backfill_value(key);
                record.insert(key.clone(), value);
            }
        }

        Ok(())
    }

    fn backfill_value(&self, key: &str) -> Value {
        match self.meta.column(key) {
            Some(column) => column
                .default_expr()
                .and_then(|expr| DefaultExpr::parse(expr).evaluate(self.ctx, self.now))
                .unwrap_or_else(|| column.column_type.fallback_value()),
            None => Value::Null,
        }
    }

    fn drop_unknown_fields(&self, record: &mut Record) {
        if !self.meta.is_configured() {
            return;
        }

        let pk = self.meta.primary_key();
        record.retain(|key, _| {
            let known = key == pk
                || key == "id"
                || is_audit_column(key)
                || self.meta.column(key).is_some();
            if !known {
                tracing::warn!(table = %self.meta.table, field = %key, "dropping unknown field");
            }
            known
        });
    }

    /// 2~3단계: 컨텍스트, 기본값 표현식
    fn fill_from_sources(&self, column: &ColumnDefinition, record: &mut Record) {
        let name = &column.column_name;
        if has_value(record, name) {
            return;
        }

        if column.edit_flag {
            if let Some(value) = self.ctx.get(name) {
                tracing::debug!(table = %self.meta.table, field = %name, "filled from user context");
                record.insert(name.clone(), value);
                return;
            }
        }

        if let Some(expr) = column.default_expr() {
            if let Some(value) = DefaultExpr::parse(expr).evaluate(self.ctx, self.now) {
                tracing::debug!(table = %self.meta.table, field = %name, expr, "filled from default");
                record.insert(name.clone(), value);
            }
        }
    }

    fn stamp_audit(&self, column: &ColumnDefinition, kind: WriteKind, record: &mut Record) {
        let name = &column.column_name;
        if has_value(record, name) {
            return;
        }

        if let Some(value) = audit_value(name, kind, self.ctx, self.now) {
            record.insert(name.clone(), value);
            return;
        }

        // update에서 insert 전용 감사 컬럼은 건드리지 않음
        if kind == WriteKind::Insert || record.contains_key(name) {
            self.fill_from_sources(column, record);
        }
    }

    fn check_required(&self, record: &Record, applies: impl Fn(&str) -> bool) -> Result<()> {
        for column in self.meta.columns.iter().filter(|c| c.required) {
            let name = column.column_name.as_str();
            if applies(name) && !has_value(record, name) {
                return Err(Error::required(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::schema::ColumnType;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn article_meta() -> TableMeta {
        TableMeta {
            table: "article".to_string(),
            columns: vec![
                ColumnDefinition::new("article", "title").required(),
                ColumnDefinition::new("article", "status")
                    .with_column_type(ColumnType::Number)
                    .with_default("1"),
                ColumnDefinition::new("article", "content"),
                ColumnDefinition::new("article", "views").with_column_type(ColumnType::Number),
                ColumnDefinition::new("article", "dept").editable(),
                ColumnDefinition::new("article", "org_id").with_default("orgId()"),
                ColumnDefinition::new("article", "create_by"),
                ColumnDefinition::new("article", "created_at"),
                ColumnDefinition::new("article", "update_by"),
                ColumnDefinition::new("article", "updated_at"),
            ],
            ..Default::default()
        }
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_default_expr_parsing() {
        assert_eq!(DefaultExpr::parse("NOW()"), DefaultExpr::Now);
        assert_eq!(DefaultExpr::parse(" uuid() "), DefaultExpr::Uuid);
        assert_eq!(DefaultExpr::parse("UserId()"), DefaultExpr::UserId);
        assert_eq!(DefaultExpr::parse("orgid()"), DefaultExpr::OrgId);
        assert_eq!(
            DefaultExpr::parse("draft"),
            DefaultExpr::Literal("draft".to_string())
        );
    }

    #[test]
    fn test_literal_evaluation() {
        let ctx = UserContext::anonymous();
        let now = fixed_now();
        assert_eq!(DefaultExpr::parse("42").evaluate(&ctx, now), Some(Value::Int(42)));
        assert_eq!(DefaultExpr::parse("-3").evaluate(&ctx, now), Some(Value::Int(-3)));
        assert_eq!(
            DefaultExpr::parse("1.5").evaluate(&ctx, now),
            Some(Value::from("1.5"))
        );
        assert_eq!(DefaultExpr::parse("userId()").evaluate(&ctx, now), None);
        assert_eq!(
            DefaultExpr::parse("now()").evaluate(&ctx, now),
            Some(Value::Timestamp(now))
        );
    }

    #[test]
    fn test_insert_fills_in_order() {
        let meta = article_meta();
        let ctx = UserContext::new(9, "alice")
            .with_org_id(5)
            .with_field("dept", "ops");
        let resolver = DefaultResolver::new(&meta, &ctx).with_clock(fixed_now());

        let mut rec = record(&[("id", Value::from("")), ("title", Value::from("hello"))]);
        resolver.resolve_for_insert(&mut rec).unwrap();

        assert!(!rec.contains_key("id"));
        assert_eq!(rec["title"], Value::from("hello"));
        assert_eq!(rec["status"], Value::Int(1));
        assert_eq!(rec["dept"], Value::from("ops"));
        assert_eq!(rec["org_id"], Value::Int(5));
        assert_eq!(rec["content"], Value::from(""));
        assert_eq!(rec["views"], Value::Int(0));
        assert_eq!(rec["create_by"], Value::Int(9));
        assert_eq!(rec["created_at"], Value::Timestamp(fixed_now()));
        assert_eq!(rec["update_by"], Value::Int(9));
    }

    #[test]
    fn test_configured_primary_key_is_left_to_store() {
        let meta = TableMeta {
            table: "note".to_string(),
            columns: vec![
                ColumnDefinition::new("note", "id").with_column_type(ColumnType::Number),
                ColumnDefinition::new("note", "title"),
            ],
            ..Default::default()
        };
        let ctx = UserContext::anonymous();
        let resolver = DefaultResolver::new(&meta, &ctx);

        let mut rec = record(&[("id", Value::from("")), ("title", Value::from("a"))]);
        resolver.resolve_for_insert(&mut rec).unwrap();
        assert!(!rec.contains_key("id"));
        assert_eq!(rec["title"], Value::from("a"));

        let mut records = vec![
            record(&[("id", Value::Int(4)), ("title", Value::from("kept"))]),
            record(&[("title", Value::from("new"))]),
        ];
        resolver.resolve_batch(&mut records).unwrap();
        assert_eq!(records[0]["id"], Value::Int(4));
        assert!(!records[1].contains_key("id"));
    }

    #[test]
    fn test_caller_value_wins_over_context_and_default() {
        let meta = article_meta();
        let ctx = UserContext::new(9, "alice").with_org_id(5);
        let resolver = DefaultResolver::new(&meta, &ctx);

        let mut rec = record(&[
            ("title", Value::from("t")),
            ("org_id", Value::Int(7)),
            ("create_by", Value::Int(1)),
        ]);
        resolver.resolve_for_insert(&mut rec).unwrap();

        assert_eq!(rec["org_id"], Value::Int(7));
        assert_eq!(rec["create_by"], Value::Int(1));
    }

    #[test]
    fn test_org_id_default_without_audit_context() {
        let meta = TableMeta {
            table: "t".to_string(),
            columns: vec![ColumnDefinition::new("t", "org_id").with_default("orgId()")],
            ..Default::default()
        };
        let ctx = UserContext::new(1, "u").with_org_id(5);
        let mut rec = Record::new();
        DefaultResolver::new(&meta, &ctx)
            .resolve_for_insert(&mut rec)
            .unwrap();
        assert_eq!(rec["org_id"], Value::Int(5));
    }

    #[test]
    fn test_required_without_source_fails() {
        let meta = article_meta();
        let ctx = UserContext::anonymous();
        let mut rec = record(&[("content", Value::from("body"))]);

        let err = DefaultResolver::new(&meta, &ctx)
            .resolve_for_insert(&mut rec)
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "title"));
    }

    #[test]
    fn test_required_with_default_passes() {
        let meta = TableMeta {
            table: "t".to_string(),
            columns: vec![ColumnDefinition::new("t", "level")
                .required()
                .with_column_type(ColumnType::Number)
                .with_default("0")],
            ..Default::default()
        };
        let ctx = UserContext::anonymous();
        let mut rec = Record::new();
        DefaultResolver::new(&meta, &ctx)
            .resolve_for_insert(&mut rec)
            .unwrap();
        assert_eq!(rec["level"], Value::Int(0));
    }

    #[test]
    fn test_required_numeric_gets_no_type_fallback() {
        let meta = TableMeta {
            table: "t".to_string(),
            columns: vec![ColumnDefinition::new("t", "level")
                .required()
                .with_column_type(ColumnType::Number)],
            ..Default::default()
        };
        let ctx = UserContext::anonymous();
        let mut rec = Record::new();
        assert!(DefaultResolver::new(&meta, &ctx)
            .resolve_for_insert(&mut rec)
            .is_err());
    }

    #[test]
    fn test_unknown_fields_dropped_for_configured_table() {
        let meta = article_meta();
        let ctx = UserContext::anonymous();
        let mut rec = record(&[
            ("title", Value::from("t")),
            ("bogus", Value::from("x")),
            ("id", Value::Int(3)),
        ]);
        DefaultResolver::new(&meta, &ctx)
            .resolve_for_insert(&mut rec)
            .unwrap();
        assert!(!rec.contains_key("bogus"));
        assert_eq!(rec["id"], Value::Int(3));
    }

    #[test]
    fn test_unconfigured_table_passes_through() {
        let meta = TableMeta::unconfigured("free");
        let ctx = UserContext::anonymous();
        let mut rec = record(&[("anything", Value::from("x"))]);
        DefaultResolver::new(&meta, &ctx)
            .resolve_for_insert(&mut rec)
            .unwrap();
        assert_eq!(rec, record(&[("anything", Value::from("x"))]));
    }

    #[test]
    fn test_update_touches_present_columns_only() {
        let meta = article_meta();
        let ctx = UserContext::new(9, "alice").with_org_id(5);
        let resolver = DefaultResolver::new(&meta, &ctx).with_clock(fixed_now());

        let mut rec = record(&[("status", Value::from(""))]);
        resolver.resolve_for_update(&mut rec).unwrap();

        assert_eq!(rec["status"], Value::Int(1));
        assert_eq!(rec["update_by"], Value::Int(9));
        assert_eq!(rec["updated_at"], Value::Timestamp(fixed_now()));
        assert!(!rec.contains_key("title"));
        assert!(!rec.contains_key("content"));
        assert!(!rec.contains_key("create_by"));
        assert!(!rec.contains_key("created_at"));
        assert!(!rec.contains_key("org_id"));
    }

    #[test]
    fn test_update_required_present_but_empty_fails() {
        let meta = article_meta();
        let ctx = UserContext::anonymous();
        let mut rec = record(&[("title", Value::from("  "))]);
        assert!(DefaultResolver::new(&meta, &ctx)
            .resolve_for_update(&mut rec)
            .is_err());
    }

    #[test]
    fn test_batch_unions_columns() {
        let meta = TableMeta {
            table: "article".to_string(),
            columns: vec![
                ColumnDefinition::new("article", "title"),
                ColumnDefinition::new("article", "status")
                    .with_column_type(ColumnType::Number)
                    .with_default("1"),
            ],
            ..Default::default()
        };
        let ctx = UserContext::anonymous();
        let mut records = vec![
            record(&[("title", Value::from("a"))]),
            record(&[("title", Value::from("b")), ("status", Value::Int(2))]),
        ];

        DefaultResolver::new(&meta, &ctx)
            .resolve_batch(&mut records)
            .unwrap();

        assert_eq!(records[0]["status"], Value::Int(1));
        assert_eq!(records[1]["status"], Value::Int(2));
    }

    #[test]
    fn test_batch_backfills_unconfigured_keys_with_null() {
        let meta = TableMeta::unconfigured("free");
        let ctx = UserContext::anonymous();
        let mut records = vec![
            record(&[("a", Value::Int(1))]),
            record(&[("b", Value::Int(2))]),
        ];

        DefaultResolver::new(&meta, &ctx)
            .resolve_batch(&mut records)
            .unwrap();

        assert_eq!(records[0]["b"], Value::Null);
        assert_eq!(records[1]["a"], Value::Null);
    }

    #[test]
    fn test_batch_failure_names_field() {
        let meta = article_meta();
        let ctx = UserContext::anonymous();
        let mut records = vec![
            record(&[("title", Value::from("ok"))]),
            record(&[("content", Value::from("missing title"))]),
        ];
        let err = DefaultResolver::new(&meta, &ctx)
            .resolve_batch(&mut records)
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
