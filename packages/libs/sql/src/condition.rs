//! WHERE 조건 컴파일러
//!
//! 컬럼별 쿼리 타입/컬럼 타입 메타데이터로 하나의 boolean SQL 식을 만듭니다.
//!
//! 모든 리터럴은 검증된 숫자 토큰이거나 작은따옴표를 이중화한 문자열입니다.
//! 호출자 값이 그대로 들어가는 경로는 없고, `raw_sql`은 카탈로그에 작성된
//! SQL 조각의 `{value}` 자리에 따옴표 처리된 값만 넣습니다.

use std::collections::BTreeMap;

use mcrud_core::schema::{ColumnDefinition, ColumnType, QueryType, TableMeta};
use mcrud_core::{Error, Params, Result};

use crate::coerce::{coerce, is_multi_value, RANGE_SEPARATORS};
use crate::guard;
use crate::params::{split_key, strip_reserved};

/// 조건 결합자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Joiner::And => " AND ",
            Joiner::Or => " OR ",
        }
    }
}

/// 컴파일된 조건
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCondition {
    /// SQL boolean 식 (빈 문자열 = 필터 없음)
    pub sql: String,
    /// 형제 조건을 결합한 결합자
    pub joiner: Joiner,
}

impl CompiledCondition {
    /// 필터 없음
    pub fn empty() -> Self {
        Self {
            sql: String::new(),
            joiner: Joiner::And,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

/// 컴파일 대상 컬럼 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// 파라미터 키 (접미사 제거, 한정자 포함 가능)
    pub name: String,
    /// 실제 적용할 쿼리 타입
    pub query_type: QueryType,
    /// 리터럴 포맷 분류
    pub column_type: ColumnType,
    /// `raw_sql`용 카탈로그 SQL 조각
    pub fragment: Option<String>,
}

impl ColumnSpec {
    /// 문자열 컬럼 설정
    pub fn new(name: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            name: name.into(),
            query_type,
            column_type: ColumnType::String,
            fragment: None,
        }
    }

    pub fn with_column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// 컬럼 정의에서 생성
    pub fn from_definition(name: impl Into<String>, def: &ColumnDefinition) -> Self {
        Self {
            name: name.into(),
            query_type: def.effective_query_type(),
            column_type: def.column_type,
            fragment: def.sql_fragment.clone(),
        }
    }
}

/// 조건 컴파일
///
/// `params`의 키는 접미사가 제거된 컬럼 이름이고 값은 `coerce`를 거친 문자열입니다.
/// 설정(`columns`)이 없는 키와 빈 값은 건너뜁니다.
pub fn compile(
    table: &str,
    params: &BTreeMap<String, String>,
    columns: &[ColumnSpec],
    exact_match: bool,
) -> CompiledCondition {
    let joiner = if exact_match { Joiner::And } else { Joiner::Or };

    let parts: Vec<String> = params
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .filter_map(|(key, value)| {
            let spec = columns.iter().find(|c| c.name == *key)?;
            build_condition(&qualify(table, key), value, spec)
        })
        .collect();

    CompiledCondition {
        sql: parts.join(joiner.as_sql()),
        joiner,
    }
}

/// 요청 파라미터를 테이블 메타데이터로 해석해 AND 조건으로 컴파일
///
/// - 예약 키(페이지/정렬)는 제외합니다.
/// - 키 접미사가 설정된 쿼리 타입보다 우선합니다.
/// - 접미사 없는 키의 값이 리스트나 콤마 구분 문자열이고 컬럼이 `eq`(또는 미설정)이면 `in`으로 처리합니다.
/// - 설정된 테이블에서 알 수 없는 키는 경고 후 제외합니다 (기본 키 제외). 설정 없는 테이블은 문자열 `eq`로 처리합니다.
pub fn compile_params(meta: &TableMeta, params: &Params) -> Result<CompiledCondition> {
    let mut coerced: BTreeMap<String, String> = BTreeMap::new();
    let mut specs: BTreeMap<String, ColumnSpec> = BTreeMap::new();

    for (key, value) in strip_reserved(params) {
        if value.is_empty() {
            continue;
        }

        let (column, suffix_type) = split_key(meta, &key);
        if !guard::is_qualified_identifier(column) {
            return Err(Error::unsafe_expression("filter key", key.as_str()));
        }

        let definition = match column.rsplit_once('.') {
            Some((qualifier, base)) if qualifier.eq_ignore_ascii_case(&meta.table) => {
                meta.column(base)
            }
            Some(_) => None,
            None => meta.column(column),
        };

        let is_primary_key = definition.is_none() && column.eq_ignore_ascii_case(meta.primary_key());
        if definition.is_none() && meta.is_configured() && !column.contains('.') && !is_primary_key
        {
            tracing::warn!(table = %meta.table, field = %column, "unknown filter column ignored");
            continue;
        }

        let configured = definition.map(|d| d.effective_query_type());
        let query_type = match suffix_type {
            Some(t) => t,
            None if is_multi_value(&value)
                && matches!(configured, None | Some(QueryType::Eq)) =>
            {
                QueryType::In
            }
            None => configured.unwrap_or_default(),
        };

        let text = coerce(&value, query_type);
        if text.is_empty() {
            continue;
        }

        let mut spec = match definition {
            Some(def) => ColumnSpec::from_definition(column, def),
            // 숫자가 아닌 키 값은 literal()에서 따옴표 처리됨
            None if is_primary_key => {
                ColumnSpec::new(column, QueryType::Eq).with_column_type(ColumnType::Number)
            }
            None => ColumnSpec::new(column, QueryType::Eq),
        };
        spec.query_type = query_type;

        coerced.insert(column.to_string(), text);
        specs.insert(column.to_string(), spec);
    }

    let specs: Vec<ColumnSpec> = specs.into_values().collect();
    Ok(compile(&meta.table, &coerced, &specs, true))
}

/// `table.column` 한정 (이미 한정된 키는 그대로)
fn qualify(table: &str, key: &str) -> String {
    if key.contains('.') {
        key.to_string()
    } else {
        format!("{}.{}", table, key)
    }
}

fn build_condition(column: &str, value: &str, spec: &ColumnSpec) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    match spec.query_type {
        QueryType::Eq
        | QueryType::Ne
        | QueryType::Gt
        | QueryType::Ge
        | QueryType::Lt
        | QueryType::Le => {
            let op = spec.query_type.operator()?;
            Some(format!("{} {} {}", column, op, literal(value, spec.column_type)))
        }
        QueryType::Range => range_condition(column, value, spec.column_type),
        QueryType::Like => like_condition(column, value),
        QueryType::LeftLike => Some(format!("{} LIKE '%{}'", column, escape(value))),
        QueryType::RightLike => Some(format!("{} LIKE '{}%'", column, escape(value))),
        QueryType::In => in_condition(column, value, spec.column_type),
        QueryType::RawSql => match &spec.fragment {
            Some(fragment) => Some(fragment.replace("{value}", &quote(value))),
            None => {
                tracing::warn!(column, "raw_sql column has no sql fragment, condition skipped");
                None
            }
        },
    }
}

fn range_condition(column: &str, value: &str, column_type: ColumnType) -> Option<String> {
    let Some((start, end)) = RANGE_SEPARATORS
        .iter()
        .find_map(|sep| value.split_once(*sep))
    else {
        return Some(format!("{} >= {}", column, literal(value, column_type)));
    };

    match (start.trim(), end.trim()) {
        ("", "") => None,
        (start, "") => Some(format!("{} >= {}", column, literal(start, column_type))),
        ("", end) => Some(format!("{} <= {}", column, literal(end, column_type))),
        (start, end) => Some(format!(
            "{} BETWEEN {} AND {}",
            column,
            literal(start, column_type),
            literal(end, column_type)
        )),
    }
}

fn like_condition(column: &str, value: &str) -> Option<String> {
    let clauses: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("{} LIKE '%{}%'", column, escape(v)))
        .collect();

    match clauses.len() {
        0 => None,
        1 if !value.contains(',') => clauses.into_iter().next(),
        _ => Some(format!("({})", clauses.join(" OR "))),
    }
}

fn in_condition(column: &str, value: &str, column_type: ColumnType) -> Option<String> {
    let items: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| literal(v, column_type))
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(format!("{} IN ({})", column, items.join(", ")))
    }
}

/// 컬럼 타입별 리터럴 포맷
///
/// 숫자/불리언 컬럼이라도 숫자 형태가 아니면 문자열로 따옴표 처리합니다.
pub fn literal(value: &str, column_type: ColumnType) -> String {
    if column_type.is_numeric() && is_number(value) {
        return value.to_string();
    }

    if column_type == ColumnType::Boolean {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" => return "1".to_string(),
            "false" | "no" => return "0".to_string(),
            _ => {}
        }
    }

    quote(value)
}

/// 문자열 리터럴 (작은따옴표 이중화)
pub fn quote(value: &str) -> String {
    format!("'{}'", escape(value))
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// `-?\d+(\.\d+)?`
fn is_number(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.map_or(true, all_digits)
}
