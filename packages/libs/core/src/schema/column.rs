//! 컬럼 정의
//!
//! `column_attribute` 행 하나에 대응하는 컬럼 메타데이터입니다.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, QueryType};

/// 표준 감사(audit) 컬럼
pub const AUDIT_COLUMNS: &[&str] = &[
    "create_by",
    "created_at",
    "created_time",
    "create_time",
    "update_by",
    "updated_at",
    "updated_time",
    "update_time",
    "creator",
    "updater",
    "org_id",
    "tenant_id",
];

/// 컬럼 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// 테이블 이름
    #[serde(default)]
    pub table_name: String,

    /// 컬럼 이름 (소문자)
    #[serde(alias = "name")]
    pub column_name: String,

    /// 필수 여부
    #[serde(default)]
    pub required: bool,

    /// 기본 쿼리 타입 (None = eq)
    #[serde(default)]
    pub query_type: Option<QueryType>,

    /// 리터럴 포맷 분류
    #[serde(default)]
    pub column_type: ColumnType,

    /// 기본값 표현식 (리터럴 또는 `now()` 같은 함수 토큰)
    #[serde(default, alias = "default")]
    pub default_value: Option<String>,

    /// 사용자 컨텍스트에서 자동 채움 허용
    #[serde(default)]
    pub edit_flag: bool,

    /// 컨텍스트 기반 암묵 필터 참여
    #[serde(default)]
    pub search_flag: bool,

    /// `raw_sql` 쿼리 타입용 SQL 조각
    ///
    /// `{value}` 자리에는 이스케이프된 문자열 리터럴이 들어갑니다.
    #[serde(default)]
    pub sql_fragment: Option<String>,
}

impl ColumnDefinition {
    /// 새 문자열 컬럼 정의
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into().to_lowercase(),
            required: false,
            query_type: None,
            column_type: ColumnType::String,
            default_value: None,
            edit_flag: false,
            search_flag: false,
            sql_fragment: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    pub fn with_column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }

    pub fn editable(mut self) -> Self {
        self.edit_flag = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.search_flag = true;
        self
    }

    pub fn with_sql_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.sql_fragment = Some(fragment.into());
        self
    }

    /// 실제 적용되는 쿼리 타입 (미설정 시 eq)
    pub fn effective_query_type(&self) -> QueryType {
        self.query_type.unwrap_or_default()
    }

    /// 비어있지 않은 기본값 표현식
    pub fn default_expr(&self) -> Option<&str> {
        self.default_value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// 감사 컬럼인지 여부
    pub fn is_audit(&self) -> bool {
        is_audit_column(&self.column_name)
    }

    /// 이름/타입 정규화 (저장소가 대소문자를 섞어 돌려줄 수 있음)
    pub fn normalized(mut self) -> Self {
        self.table_name = self.table_name.to_lowercase();
        self.column_name = self.column_name.trim().to_lowercase();
        self
    }
}

/// 이름으로 감사 컬럼 판별
pub fn is_audit_column(name: &str) -> bool {
    AUDIT_COLUMNS.contains(&name)
}
