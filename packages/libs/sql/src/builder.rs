//! CRUD SQL 빌더
//!
//! 실행 계층에 넘길 요청 구조체와 SQL 생성 로직입니다.
//! SELECT/COUNT는 JOIN 문자열과 컴파일된 조건을 그대로 이어 붙이고,
//! INSERT/UPDATE/DELETE는 SeaQuery로 값을 이스케이프합니다.
//!
//! 식별자와 표현식 검증(`guard`)은 요청을 만드는 쪽에서 먼저 수행해야 합니다.

use std::fmt::Write as _;

use sea_query::{
    Expr, Iden, IntoTableRef, PostgresQueryBuilder, Query, SimpleExpr, TableRef,
};

use mcrud_core::value::TIMESTAMP_FORMAT;
use mcrud_core::{Error, Record, Result, Value};

use crate::condition::CompiledCondition;

/// 동적 테이블/컬럼 식별자
#[derive(Debug, Clone)]
struct DynIden(String);

impl Iden for DynIden {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }
}

fn table_ref(name: &str) -> TableRef {
    match name.split_once('.') {
        Some((schema, table)) => {
            (DynIden(schema.to_string()), DynIden(table.to_string())).into_table_ref()
        }
        None => DynIden(name.to_string()).into_table_ref(),
    }
}

/// SELECT 요청
#[derive(Debug, Clone, PartialEq)]
pub struct SelectRequest {
    pub table: String,
    /// 컬럼 목록 (`*` 또는 콤마 목록)
    pub columns: String,
    pub join: Option<String>,
    pub condition: CompiledCondition,
    pub group_by: Option<String>,
    pub order_by: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

impl SelectRequest {
    /// SQL 생성
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.columns, self.table);
        push_join(&mut sql, self.join.as_deref());
        push_where(&mut sql, &self.condition);

        if let Some(group) = self.group_by.as_deref().filter(|g| !g.trim().is_empty()) {
            let _ = write!(sql, " GROUP BY {}", group.trim());
        }
        if let Some(order) = self.order_by.as_deref().filter(|o| !o.trim().is_empty()) {
            let _ = write!(sql, " ORDER BY {}", order.trim());
        }

        let _ = write!(sql, " LIMIT {} OFFSET {}", self.limit, self.offset);
        sql
    }
}

/// COUNT 요청
#[derive(Debug, Clone, PartialEq)]
pub struct CountRequest {
    pub table: String,
    pub join: Option<String>,
    pub condition: CompiledCondition,
}

impl CountRequest {
    /// SQL 생성 (결과 컬럼: `total`)
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) AS total FROM {}", self.table);
        push_join(&mut sql, self.join.as_deref());
        push_where(&mut sql, &self.condition);
        sql
    }
}

fn push_join(sql: &mut String, join: Option<&str>) {
    if let Some(join) = join.filter(|j| !j.trim().is_empty()) {
        let _ = write!(sql, " {}", join.trim());
    }
}

fn push_where(sql: &mut String, condition: &CompiledCondition) {
    if !condition.is_empty() {
        let _ = write!(sql, " WHERE {}", condition.sql);
    }
}

/// INSERT 요청 (행이 여러 개면 배치 insert)
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRequest {
    pub table: String,
    pub primary_key: String,
    /// 공통 컬럼 목록
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl InsertRequest {
    /// 단건 insert
    pub fn single(table: impl Into<String>, primary_key: impl Into<String>, record: Record) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            columns: record.keys().cloned().collect(),
            rows: vec![record],
        }
    }

    /// 배치 insert (컬럼 목록은 첫 레코드 기준)
    pub fn batch(table: impl Into<String>, primary_key: impl Into<String>, rows: Vec<Record>) -> Self {
        let columns = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            columns,
            rows,
        }
    }

    /// SQL 생성
    ///
    /// 단건이면 기본 키를 RETURNING 합니다. 레코드에 없는 컬럼은 NULL이고,
    /// 없는 기본 키는 `DEFAULT`입니다.
    pub fn to_sql(&self) -> Result<String> {
        let mut query = Query::insert();
        query.into_table(table_ref(&self.table));
        query.columns(self.columns.iter().map(|c| DynIden(c.clone())));

        for row in &self.rows {
            let values: Vec<SimpleExpr> = self
                .columns
                .iter()
                .map(|c| match row.get(c) {
                    Some(value) => value_to_expr(value),
                    None if *c == self.primary_key => Expr::cust("DEFAULT"),
                    None => null_expr(),
                })
                .collect();
            query.values(values).map_err(Error::execution)?;
        }

        if self.rows.len() == 1 {
            query.returning(Query::returning().column(DynIden(self.primary_key.clone())));
        }

        Ok(query.to_string(PostgresQueryBuilder))
    }
}

/// UPDATE 요청 (기본 키 IN 목록)
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub table: String,
    pub primary_key: String,
    pub ids: Vec<Value>,
    pub record: Record,
}

impl UpdateRequest {
    /// SQL 생성 (기본 키 컬럼은 SET에서 제외)
    pub fn to_sql(&self) -> String {
        let mut query = Query::update();
        query.table(table_ref(&self.table));
        query.values(
            self.record
                .iter()
                .filter(|(k, _)| **k != self.primary_key)
                .map(|(k, v)| (DynIden(k.clone()), value_to_expr(v))),
        );
        query.and_where(
            Expr::col(DynIden(self.primary_key.clone())).is_in(self.ids.iter().map(value_to_expr)),
        );
        query.to_string(PostgresQueryBuilder)
    }
}

/// DELETE 요청 (기본 키 IN 목록)
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub table: String,
    pub primary_key: String,
    pub ids: Vec<Value>,
}

impl DeleteRequest {
    /// SQL 생성
    pub fn to_sql(&self) -> String {
        let mut query = Query::delete();
        query.from_table(table_ref(&self.table));
        query.and_where(
            Expr::col(DynIden(self.primary_key.clone())).is_in(self.ids.iter().map(value_to_expr)),
        );
        query.to_string(PostgresQueryBuilder)
    }
}

fn null_expr() -> SimpleExpr {
    Expr::val(Option::<String>::None).into()
}

/// Value를 SeaQuery Expr로 변환
///
/// 불리언은 조건 컴파일러, 타입 기반 기본값과 같게 `1`/`0`으로 씁니다.
fn value_to_expr(value: &Value) -> SimpleExpr {
    match value {
        Value::Null => null_expr(),
        Value::Bool(b) => Expr::val(i64::from(*b)).into(),
        Value::Int(i) => Expr::val(*i).into(),
        Value::Float(f) => Expr::val(*f).into(),
        Value::Text(s) => Expr::val(s.as_str()).into(),
        // JSON 문자열로 직렬화
        Value::List(_) => Expr::val(value.to_json().to_string()).into(),
        Value::Timestamp(ts) => Expr::val(ts.format(TIMESTAMP_FORMAT).to_string()).into(),
    }
}
