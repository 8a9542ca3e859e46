//! 요청 파라미터 해석
//!
//! HTTP 계층에서 넘어온 파라미터 맵에서 페이지/정렬 키를 분리하고,
//! 필터 키의 접미사(`_like`, `_in`, `_between`, `_range`)를 해석합니다.

use mcrud_core::schema::{QueryType, TableMeta};
use mcrud_core::{Params, Value};

/// 필터 컬럼으로 취급하지 않는 예약 키
pub const RESERVED_KEYS: &[&str] = &[
    "pageIndex",
    "pageSize",
    "sortByAndType",
    "targetTable",
    "columns",
    "groupBy",
];

/// 기본 페이지 크기
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// 예약 키 제거
pub fn strip_reserved(params: &Params) -> Params {
    params
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// 키 접미사 분리
///
/// 접미사로는 `like`, `in`, `range`만 선택할 수 있습니다.
/// `raw_sql`은 카탈로그에서만 설정됩니다.
pub fn split_suffix(key: &str) -> (&str, Option<QueryType>) {
    const SUFFIXES: &[(&str, QueryType)] = &[
        ("_like", QueryType::Like),
        ("_in", QueryType::In),
        ("_between", QueryType::Range),
        ("_range", QueryType::Range),
    ];

    for (suffix, query_type) in SUFFIXES {
        if let Some(column) = key.strip_suffix(*suffix) {
            if !column.is_empty() {
                return (column, Some(*query_type));
            }
        }
    }
    (key, None)
}

/// 테이블 메타데이터를 고려한 키 분리
///
/// 키 전체가 설정된 컬럼 이름이면 (`check_in` 등) 접미사로 보지 않습니다.
pub fn split_key<'a>(meta: &TableMeta, key: &'a str) -> (&'a str, Option<QueryType>) {
    let base = match key.rsplit_once('.') {
        Some((qualifier, base)) if qualifier.eq_ignore_ascii_case(&meta.table) => base,
        Some(_) => return split_suffix(key),
        None => key,
    };
    if meta.column(base).is_some() {
        return (key, None);
    }
    split_suffix(key)
}

/// 쿼리 타입에 대응하는 접미사 (없으면 빈 문자열)
pub fn suffix_for(query_type: QueryType) -> &'static str {
    match query_type {
        QueryType::Like => "_like",
        QueryType::In => "_in",
        QueryType::Range => "_range",
        _ => "",
    }
}

/// 페이지 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 0부터 시작하는 페이지 번호
    pub page_index: u64,
    /// 페이지 크기
    pub page_size: u64,
}

impl Pagination {
    /// 페이지 정보 정규화
    ///
    /// 0 이하의 페이지 크기는 `default_size`로, 음수 페이지 번호는 0으로 바꿉니다.
    pub fn new(page_index: i64, page_size: i64, default_size: u64) -> Self {
        let page_size = if page_size <= 0 {
            default_size.max(1)
        } else {
            page_size as u64
        };
        Self {
            page_index: page_index.max(0) as u64,
            page_size,
        }
    }

    /// 파라미터 맵의 `pageIndex` / `pageSize`에서 읽기
    pub fn from_params(params: &Params, default_size: u64) -> Self {
        let read = |key: &str| params.get(key).and_then(Value::as_i64).unwrap_or(0);
        Self::new(read("pageIndex"), read("pageSize"), default_size)
    }

    /// OFFSET 값
    pub fn offset(&self) -> u64 {
        self.page_index.saturating_mul(self.page_size)
    }
}

/// 파라미터 맵에서 비어있지 않은 문자열 값 읽기
pub fn text_param(params: &Params, key: &str) -> Option<String> {
    params
        .get(key)
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_strip_reserved() {
        let p = params(&[
            ("pageIndex", Value::Int(1)),
            ("pageSize", Value::Int(20)),
            ("sortByAndType", Value::from("id ASC")),
            ("username", Value::from("adm")),
        ]);
        let stripped = strip_reserved(&p);
        assert_eq!(stripped.len(), 1);
        assert!(stripped.contains_key("username"));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("username_like"), ("username", Some(QueryType::Like)));
        assert_eq!(split_suffix("status_in"), ("status", Some(QueryType::In)));
        assert_eq!(split_suffix("age_range"), ("age", Some(QueryType::Range)));
        assert_eq!(split_suffix("age_between"), ("age", Some(QueryType::Range)));
        assert_eq!(split_suffix("title"), ("title", None));
        assert_eq!(split_suffix("_in"), ("_in", None));
    }

    #[test]
    fn test_split_key_prefers_configured_column() {
        use mcrud_core::schema::ColumnDefinition;

        let meta = TableMeta {
            table: "booking".to_string(),
            columns: vec![
                ColumnDefinition::new("booking", "check_in"),
                ColumnDefinition::new("booking", "guest"),
            ],
            ..Default::default()
        };

        assert_eq!(split_key(&meta, "check_in"), ("check_in", None));
        assert_eq!(split_key(&meta, "booking.check_in"), ("booking.check_in", None));
        assert_eq!(
            split_key(&meta, "check_in_range"),
            ("check_in", Some(QueryType::Range))
        );
        assert_eq!(split_key(&meta, "guest_like"), ("guest", Some(QueryType::Like)));
    }

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::new(0, 0, 10);
        assert_eq!(p.page_size, 10);
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(3, 20, 10);
        assert_eq!(p.offset(), 60);

        let p = Pagination::new(-1, -5, 10);
        assert_eq!(p.page_index, 0);
        assert_eq!(p.page_size, 10);
    }

    #[test]
    fn test_pagination_from_params() {
        let p = params(&[("pageIndex", Value::from("2")), ("pageSize", Value::Int(5))]);
        let page = Pagination::from_params(&p, 10);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.page_size, 5);
        assert_eq!(page.offset(), 10);
    }
}
