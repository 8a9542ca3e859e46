//! 쿼리 타입 / 컬럼 타입 정의
//!
//! 카탈로그의 문자열 설정을 닫힌 열거형으로 바꿔
//! 조건 컴파일러에서 모든 경우를 빠짐없이 매칭하도록 합니다.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// 컬럼별 비교/매칭 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// 같음 (기본값)
    #[default]
    Eq,
    /// 같지 않음
    Ne,
    /// 보다 큼
    Gt,
    /// 보다 크거나 같음
    #[serde(alias = "gte")]
    Ge,
    /// 보다 작음
    Lt,
    /// 보다 작거나 같음
    #[serde(alias = "lte")]
    Le,
    /// 양쪽 LIKE (`%v%`), 콤마 구분 다중값은 OR
    Like,
    /// 왼쪽 와일드카드 (`%v`)
    LeftLike,
    /// 오른쪽 와일드카드 (`v%`)
    RightLike,
    /// IN 목록
    In,
    /// 범위 (`a~b`)
    #[serde(alias = "between")]
    Range,
    /// 카탈로그에 작성된 SQL 조각
    #[serde(alias = "ext")]
    RawSql,
}

impl QueryType {
    /// 카탈로그 문자열에서 파싱 (대소문자 무시)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" | "=" => Some(QueryType::Eq),
            "ne" | "!=" | "<>" => Some(QueryType::Ne),
            "gt" | ">" => Some(QueryType::Gt),
            "ge" | "gte" | ">=" => Some(QueryType::Ge),
            "lt" | "<" => Some(QueryType::Lt),
            "le" | "lte" | "<=" => Some(QueryType::Le),
            "like" => Some(QueryType::Like),
            "left_like" => Some(QueryType::LeftLike),
            "right_like" => Some(QueryType::RightLike),
            "in" => Some(QueryType::In),
            "range" | "between" => Some(QueryType::Range),
            "raw_sql" | "ext" => Some(QueryType::RawSql),
            _ => None,
        }
    }

    /// 비교 연산자 (비교형 쿼리 타입만)
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            QueryType::Eq => Some("="),
            QueryType::Ne => Some("!="),
            QueryType::Gt => Some(">"),
            QueryType::Ge => Some(">="),
            QueryType::Lt => Some("<"),
            QueryType::Le => Some("<="),
            _ => None,
        }
    }
}

/// 리터럴 포맷 분류
///
/// DB 물리 타입과 무관하게 값을 따옴표로 감쌀지 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 문자열 (기본값)
    #[default]
    String,
    /// 숫자
    #[serde(alias = "int", alias = "integer", alias = "decimal")]
    Number,
    /// 불리언
    #[serde(alias = "bool", alias = "switch")]
    Boolean,
}

impl ColumnType {
    /// 카탈로그 문자열에서 파싱
    ///
    /// 레거시 숫자 코드(1=문자열, 2=숫자, 3=불리언)와 화면 타입 이름도 받습니다.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" | "text" | "1" => Some(ColumnType::String),
            "number" | "int" | "integer" | "decimal" | "2" => Some(ColumnType::Number),
            "boolean" | "bool" | "switch" | "3" => Some(ColumnType::Boolean),
            _ => None,
        }
    }

    /// 값 소스가 없을 때 쓰는 타입 기반 기본값
    pub fn fallback_value(&self) -> Value {
        match self {
            ColumnType::Number | ColumnType::Boolean => Value::Int(0),
            ColumnType::String => Value::Text(String::new()),
        }
    }

    /// 숫자/불리언처럼 따옴표 없이 쓸 수 있는 타입인지
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Number | ColumnType::Boolean)
    }
}
