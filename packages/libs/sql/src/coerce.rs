//! 값 변환
//!
//! 임의 형태의 입력 값을 쿼리 타입이 기대하는 문자열로 바꿉니다.
//! 빈 문자열 결과는 "조건 없음"을 뜻합니다.

use mcrud_core::schema::QueryType;
use mcrud_core::Value;

/// 범위 구분자
pub const RANGE_SEPARATORS: &[&str] = &["~", "至", ","];

/// 쿼리 타입에 맞는 문자열로 변환
pub fn coerce(value: &Value, query_type: QueryType) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::List(items) => coerce_list(items, query_type),
        Value::Text(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn coerce_list(items: &[Value], query_type: QueryType) -> String {
    let parts: Vec<String> = items
        .iter()
        .filter(|v| !matches!(v, Value::Null))
        .map(|v| coerce(v, QueryType::Eq))
        .collect();

    if query_type == QueryType::Range {
        return match parts.as_slice() {
            [] => String::new(),
            [lower] => format!("{}~", lower),
            [lower, upper, ..] => format!("{}~{}", lower, upper),
        };
    }

    parts.join(",")
}

/// 값이 여러 개를 담고 있는지 (리스트 또는 콤마 구분 문자열)
pub fn is_multi_value(value: &Value) -> bool {
    match value {
        Value::List(_) => true,
        Value::Text(s) => s.contains(','),
        _ => false,
    }
}
