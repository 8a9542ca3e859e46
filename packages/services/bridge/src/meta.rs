//! Postgres 메타데이터 저장소
//!
//! `table_attribute`, `column_attribute`, `column_check_property` 테이블에서 카탈로그를 읽습니다.
//! 컬럼 타입이 다양할 수 있어 모든 값을 `::text`로 읽고 여기서 해석합니다.
//! `raw_sql` 컬럼의 SQL 조각은 `column_attribute.sql_fragment`에 둡니다.

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::postgres::PgPool;
use sqlx::FromRow;

use mcrud_core::schema::{
    ColumnDefinition, ColumnType, QueryType, RuleMode, TableDefaults, ValidationRule,
};
use mcrud_core::{Error, MetadataSource, Result};

const COLUMNS_SQL: &str = "SELECT column_name::text AS column_name, is_required::text AS is_required, \
     query_type::text AS query_type, column_type::text AS column_type, show_type::text AS show_type, \
     default_value::text AS default_value, edit_flag::text AS edit_flag, search_flag::text AS search_flag, \
     sql_fragment::text AS sql_fragment \
     FROM column_attribute WHERE lower(db_table_name) = $1";

const DEFAULTS_SQL: &str = "SELECT main_key::text AS main_key, sort::text AS sort \
     FROM table_attribute WHERE lower(dbtable) = $1 LIMIT 1";

const RULES_SQL: &str = "SELECT check_column::text AS check_column, check_mode::text AS check_mode, \
     target_table::text AS target_table, params::text AS params, \"errorMsg\"::text AS error_msg \
     FROM column_check_property WHERE lower(check_table) = $1 AND status::text = '1' \
     ORDER BY check_order";

/// `column_attribute` 행
#[derive(Debug, Default, FromRow)]
pub struct ColumnRow {
    pub column_name: Option<String>,
    pub is_required: Option<String>,
    pub query_type: Option<String>,
    pub column_type: Option<String>,
    pub show_type: Option<String>,
    pub default_value: Option<String>,
    pub edit_flag: Option<String>,
    pub search_flag: Option<String>,
    pub sql_fragment: Option<String>,
}

/// `table_attribute` 행
#[derive(Debug, Default, FromRow)]
pub struct DefaultsRow {
    pub main_key: Option<String>,
    pub sort: Option<String>,
}

/// `column_check_property` 행
#[derive(Debug, Default, FromRow)]
pub struct RuleRow {
    pub check_column: Option<String>,
    pub check_mode: Option<String>,
    pub target_table: Option<String>,
    pub params: Option<String>,
    pub error_msg: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RangeParams {
    min: Option<f64>,
    max: Option<f64>,
}

/// Postgres 카탈로그 저장소
pub struct PgMetadataSource {
    pool: PgPool,
}

impl PgMetadataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataSource for PgMetadataSource {
    async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
        let rows: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| unavailable(table, e))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_definition(table))
            .collect())
    }

    async fn load_defaults(&self, table: &str) -> Result<TableDefaults> {
        let row: Option<DefaultsRow> = sqlx::query_as(DEFAULTS_SQL)
            .bind(table)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unavailable(table, e))?;

        Ok(row.map(DefaultsRow::into_defaults).unwrap_or_default())
    }

    async fn load_rules(&self, table: &str) -> Result<Vec<ValidationRule>> {
        let rows: Vec<RuleRow> = sqlx::query_as(RULES_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| unavailable(table, e))?;

        Ok(rows.into_iter().filter_map(RuleRow::into_rule).collect())
    }
}

fn unavailable(table: &str, e: sqlx::Error) -> Error {
    Error::MetadataUnavailable {
        table: table.to_string(),
        message: e.to_string(),
    }
}

fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn flag(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "t" | "y" | "yes")
    )
}

impl ColumnRow {
    /// 컬럼 정의로 변환 (이름이 없으면 None)
    ///
    /// `column_type`이 없으면 `show_type`으로 추정합니다: `number` → 숫자, `switch` → 불린.
    pub fn into_definition(self, table: &str) -> Option<ColumnDefinition> {
        let name = text(self.column_name)?;
        let mut def = ColumnDefinition::new(table, name);

        def.required = flag(&self.is_required);
        def.edit_flag = flag(&self.edit_flag);
        def.search_flag = flag(&self.search_flag);
        def.default_value = text(self.default_value);
        def.sql_fragment = text(self.sql_fragment);
        def.query_type = text(self.query_type).and_then(|q| {
            let parsed = QueryType::from_str(&q);
            if parsed.is_none() {
                tracing::warn!(table, column = %def.column_name, query_type = %q, "unknown query type");
            }
            parsed
        });
        def.column_type = text(self.column_type)
            .and_then(|t| ColumnType::from_str(&t))
            .or_else(|| match text(self.show_type)?.to_ascii_lowercase().as_str() {
                "number" => Some(ColumnType::Number),
                "switch" => Some(ColumnType::Boolean),
                _ => None,
            })
            .unwrap_or_default();

        Some(def)
    }
}

impl DefaultsRow {
    pub fn into_defaults(self) -> TableDefaults {
        let mut defaults = TableDefaults::default();
        if let Some(pk) = text(self.main_key) {
            defaults.primary_key = pk.to_lowercase();
        }
        defaults.default_sort = text(self.sort);
        defaults
    }
}

impl RuleRow {
    /// 검증 규칙으로 변환 (알 수 없는 모드는 경고 후 건너뜀)
    pub fn into_rule(self) -> Option<ValidationRule> {
        let check_column = text(self.check_column)?;
        let mode_name = text(self.check_mode)?;

        let mode = match mode_name.to_ascii_lowercase().as_str() {
            "isnotexit" | "not_exists" => RuleMode::NotExists,
            "isexit" | "exists" => RuleMode::Exists,
            "mutireapeat" | "multi_repeat" => RuleMode::MultiRepeat,
            "israng" | "range" => {
                let params: RangeParams = match text(self.params) {
                    Some(raw) => match serde_json::from_str(&raw) {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!(column = %check_column, error = %e, "invalid range params");
                            return None;
                        }
                    },
                    None => RangeParams::default(),
                };
                RuleMode::Range {
                    min: params.min,
                    max: params.max,
                }
            }
            other => {
                tracing::warn!(column = %check_column, mode = other, "unknown validation mode");
                return None;
            }
        };

        Some(ValidationRule {
            check_column,
            mode,
            target_table: text(self.target_table),
            error_msg: text(self.error_msg),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_column_type_from_show_type() {
        let def = ColumnRow {
            column_name: s(" Age "),
            is_required: s("1"),
            show_type: s("number"),
            search_flag: s("true"),
            ..Default::default()
        }
        .into_definition("sys_user")
        .unwrap();

        assert_eq!(def.column_name, "age");
        assert!(def.required);
        assert!(def.search_flag);
        assert!(!def.edit_flag);
        assert_eq!(def.column_type, ColumnType::Number);
        assert_eq!(def.query_type, None);

        let switch = ColumnRow {
            column_name: s("enabled"),
            show_type: s("switch"),
            ..Default::default()
        }
        .into_definition("sys_user")
        .unwrap();
        assert_eq!(switch.column_type, ColumnType::Boolean);
    }

    #[test]
    fn test_explicit_column_type_wins() {
        let def = ColumnRow {
            column_name: s("code"),
            column_type: s("string"),
            show_type: s("number"),
            query_type: s("like"),
            default_value: s("uuid()"),
            ..Default::default()
        }
        .into_definition("sys_user")
        .unwrap();

        assert_eq!(def.column_type, ColumnType::String);
        assert_eq!(def.query_type, Some(QueryType::Like));
        assert_eq!(def.default_expr(), Some("uuid()"));

        assert!(ColumnRow::default().into_definition("sys_user").is_none());
    }

    #[test]
    fn test_raw_sql_column_keeps_fragment() {
        let def = ColumnRow {
            column_name: s("dept_name"),
            query_type: s("ext"),
            sql_fragment: s(" sys_user.dept_id IN (SELECT id FROM sys_dept WHERE name = {value}) "),
            ..Default::default()
        }
        .into_definition("sys_user")
        .unwrap();

        assert_eq!(def.query_type, Some(QueryType::RawSql));
        assert_eq!(
            def.sql_fragment.as_deref(),
            Some("sys_user.dept_id IN (SELECT id FROM sys_dept WHERE name = {value})")
        );

        let plain = ColumnRow {
            column_name: s("age"),
            sql_fragment: s("  "),
            ..Default::default()
        }
        .into_definition("sys_user")
        .unwrap();
        assert_eq!(plain.sql_fragment, None);
    }

    #[test]
    fn test_defaults_row() {
        let defaults = DefaultsRow {
            main_key: s("USER_ID"),
            sort: s("create_time DESC"),
        }
        .into_defaults();
        assert_eq!(defaults.primary_key, "user_id");
        assert_eq!(defaults.default_sort.as_deref(), Some("create_time DESC"));

        assert_eq!(DefaultsRow::default().into_defaults().primary_key, "id");
    }

    #[test]
    fn test_rule_rows() {
        let rule = RuleRow {
            check_column: s("filename,url"),
            check_mode: s("MutiReapeat"),
            error_msg: s("filename+url exists"),
            ..Default::default()
        }
        .into_rule()
        .unwrap();
        assert_eq!(rule.mode, RuleMode::MultiRepeat);
        assert_eq!(rule.columns(), vec!["filename", "url"]);

        let range = RuleRow {
            check_column: s("age"),
            check_mode: s("isRang"),
            params: s(r#"{"min": 0, "max": 150}"#),
            ..Default::default()
        }
        .into_rule()
        .unwrap();
        assert_eq!(
            range.mode,
            RuleMode::Range {
                min: Some(0.0),
                max: Some(150.0)
            }
        );

        let unknown = RuleRow {
            check_column: s("age"),
            check_mode: s("regex"),
            ..Default::default()
        };
        assert!(unknown.into_rule().is_none());
    }
}
