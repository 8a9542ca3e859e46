//! 검색 플래그 기반 암묵 필터
//!
//! `search_flag` 컬럼이 요청 파라미터에 없으면 사용자 컨텍스트의 같은 이름 값을
//! 쿼리 타입에 맞는 접미사와 함께 파라미터에 추가합니다.

use mcrud_core::schema::TableMeta;
use mcrud_core::{Params, UserContext};

use crate::params::{split_key, suffix_for};

/// 파라미터 보강
pub fn enhance_filters(meta: &TableMeta, ctx: &UserContext, params: &mut Params) {
    for column in meta.columns.iter().filter(|c| c.search_flag) {
        let name = column.column_name.as_str();

        let supplied = params.keys().any(|key| split_key(meta, key).0 == name);
        if supplied {
            continue;
        }

        if let Some(value) = ctx.get(name) {
            let key = format!("{}{}", name, suffix_for(column.effective_query_type()));
            tracing::debug!(table = %meta.table, key = %key, "filter filled from user context");
            params.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcrud_core::schema::{ColumnDefinition, QueryType};
    use mcrud_core::Value;

    fn meta() -> TableMeta {
        TableMeta {
            table: "orders".to_string(),
            columns: vec![
                ColumnDefinition::new("orders", "org_id").searchable(),
                ColumnDefinition::new("orders", "dept")
                    .searchable()
                    .with_query_type(QueryType::Like),
                ColumnDefinition::new("orders", "title"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_fills_from_context_with_suffix() {
        let ctx = UserContext::new(1, "u")
            .with_org_id(5)
            .with_field("dept", "ops")
            .with_field("title", "ignored");
        let mut params = Params::new();

        enhance_filters(&meta(), &ctx, &mut params);

        assert_eq!(params.get("org_id"), Some(&Value::Int(5)));
        assert_eq!(params.get("dept_like"), Some(&Value::from("ops")));
        assert!(!params.contains_key("title"));
    }

    #[test]
    fn test_explicit_params_win() {
        let ctx = UserContext::new(1, "u").with_field("dept", "ops");
        let mut params = Params::new();
        params.insert("dept_in".to_string(), Value::from("a,b"));

        enhance_filters(&meta(), &ctx, &mut params);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("dept_in"), Some(&Value::from("a,b")));
    }

    #[test]
    fn test_anonymous_context_adds_nothing() {
        let mut params = Params::new();
        enhance_filters(&meta(), &UserContext::anonymous(), &mut params);
        assert!(params.is_empty());
    }
}
