//! 저장 전 검증 규칙
//!
//! 규칙의 평가는 저장소 조회가 필요하므로 `mcrud-data`에서 수행합니다.
//! 여기서는 규칙의 형태만 정의합니다.

use serde::{Deserialize, Serialize};

/// 규칙 종류
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RuleMode {
    /// 대상 테이블에 같은 값이 없어야 함 (중복 금지)
    NotExists,
    /// 대상 테이블에 같은 값이 있어야 함 (참조 존재)
    Exists,
    /// 숫자 범위
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// 여러 컬럼 조합이 중복되면 안 됨 (`check_column`은 콤마 구분)
    MultiRepeat,
}

/// 검증 규칙
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// 검사할 컬럼 (multi_repeat은 콤마 구분 목록)
    pub check_column: String,

    /// 규칙 종류
    #[serde(flatten)]
    pub mode: RuleMode,

    /// 조회 대상 테이블 (없으면 저장 대상 테이블)
    #[serde(default)]
    pub target_table: Option<String>,

    /// 위반 시 메시지
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl ValidationRule {
    /// 검사할 컬럼 목록
    pub fn columns(&self) -> Vec<&str> {
        self.check_column
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// 위반 메시지 (설정이 없으면 규칙 종류로 생성)
    pub fn message(&self) -> String {
        if let Some(msg) = self.error_msg.as_deref().filter(|m| !m.trim().is_empty()) {
            return msg.to_string();
        }

        match &self.mode {
            RuleMode::NotExists => format!("{} already exists", self.check_column),
            RuleMode::Exists => format!("{} does not exist", self.check_column),
            RuleMode::Range { min, max } => format!(
                "{} must be within [{}, {}]",
                self.check_column,
                min.map(|v| v.to_string()).unwrap_or_default(),
                max.map(|v| v.to_string()).unwrap_or_default()
            ),
            RuleMode::MultiRepeat => format!("combination of {} already exists", self.check_column),
        }
    }
}
