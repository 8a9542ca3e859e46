//! 테이블 메타데이터

use serde::{Deserialize, Serialize};

use super::column::ColumnDefinition;
use super::rule::ValidationRule;

fn default_primary_key() -> String {
    "id".to_string()
}

/// 테이블 기본 설정 (`table_attribute` 행)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefaults {
    /// 기본 키 컬럼 (기본값: "id")
    #[serde(default = "default_primary_key", alias = "main_key")]
    pub primary_key: String,

    /// 정렬 표현식이 없을 때 사용할 기본 정렬
    #[serde(default, alias = "sort")]
    pub default_sort: Option<String>,
}

impl Default for TableDefaults {
    fn default() -> Self {
        Self {
            primary_key: default_primary_key(),
            default_sort: None,
        }
    }
}

/// 한 테이블의 전체 메타데이터
///
/// 카탈로그가 테이블 이름 단위로 로드/캐시합니다.
/// 설정이 없는 테이블은 `columns`가 비어있는 상태로 표현됩니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableMeta {
    /// 테이블 이름 (소문자)
    pub table: String,

    /// 테이블 기본 설정
    pub defaults: TableDefaults,

    /// 컬럼 정의 목록
    pub columns: Vec<ColumnDefinition>,

    /// 저장 전 검증 규칙
    pub rules: Vec<ValidationRule>,
}

impl TableMeta {
    /// 설정 없는 테이블 메타
    pub fn unconfigured(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// 이름으로 컬럼 조회 (대소문자 무시)
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| c.column_name.eq_ignore_ascii_case(name))
    }

    /// 컬럼 정의가 하나라도 있는지
    pub fn is_configured(&self) -> bool {
        !self.columns.is_empty()
    }

    /// 기본 키 컬럼 이름
    pub fn primary_key(&self) -> &str {
        let pk = self.defaults.primary_key.trim();
        if pk.is_empty() {
            "id"
        } else {
            pk
        }
    }
}
