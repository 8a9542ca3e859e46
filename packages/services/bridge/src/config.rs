//! Bridge 설정

use std::env;
use std::time::Duration;

/// Bridge 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// Postgres 접속 URL
    pub database_url: String,

    /// 커넥션 풀 최대 크기
    pub max_connections: u32,

    /// 기본 페이지 크기
    pub default_page_size: u64,

    /// 쿼리 타임아웃 (초, 0 = 무제한)
    pub query_timeout_secs: u64,

    /// YAML 카탈로그 파일 경로 (있으면 DB 카탈로그 대신 사용)
    pub catalog_file: Option<String>,

    /// 사용자 컨텍스트 헤더 무시 (개발용)
    pub disable_context: bool,

    /// 기본값/필터에 쓸 수 있는 추가 컨텍스트 필드 (None = 전부 허용)
    pub context_fields: Option<Vec<String>>,
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            port: env::var("MCRUD_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,

            database_url: non_empty_var("MCRUD_DATABASE_URL").unwrap_or_default(),

            max_connections: env::var("MCRUD_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            default_page_size: env::var("MCRUD_DEFAULT_PAGE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            query_timeout_secs: env::var("MCRUD_QUERY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            catalog_file: non_empty_var("MCRUD_CATALOG_FILE"),

            disable_context: env::var("MCRUD_DISABLE_CONTEXT")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            context_fields: non_empty_var("MCRUD_CONTEXT_FIELDS").map(|v| split_list(&v)),
        };
        config.validate()?;
        Ok(config)
    }

    /// 필수 설정 확인
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.is_empty() {
            anyhow::bail!("MCRUD_DATABASE_URL is required");
        }
        if self.default_page_size == 0 {
            anyhow::bail!("MCRUD_DEFAULT_PAGE_SIZE must be positive");
        }
        Ok(())
    }

    /// 쿼리 타임아웃
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
