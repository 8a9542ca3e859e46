//! 메타데이터 카탈로그
//!
//! 테이블 이름 단위로 메타데이터를 읽고 캐시합니다.
//!
//! - 설정이 없는 테이블은 빈 메타로 돌려줍니다 (에러 아님).
//! - 로드 실패는 로그만 남기고 "설정 없음"으로 취급합니다. 실패 결과는 캐시하지 않습니다.
//! - 캐시는 TTL 없이 `invalidate` / `invalidate_all`로만 비웁니다.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::schema::{ColumnDefinition, TableDefaults, TableMeta, ValidationRule};

/// 메타데이터 저장소
///
/// 구현체는 설정이 없는 테이블에 대해 빈 목록 / 기본값을 돌려줘야 합니다.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// 컬럼 정의 조회
    async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>>;

    /// 테이블 기본 설정 조회
    async fn load_defaults(&self, table: &str) -> Result<TableDefaults>;

    /// 검증 규칙 조회
    async fn load_rules(&self, _table: &str) -> Result<Vec<ValidationRule>> {
        Ok(Vec::new())
    }

    /// 테이블 메타 전체 조회
    async fn load_table(&self, table: &str) -> Result<TableMeta> {
        Ok(TableMeta {
            table: table.to_string(),
            defaults: self.load_defaults(table).await?,
            columns: self.load_columns(table).await?,
            rules: self.load_rules(table).await?,
        })
    }
}

/// 메타데이터 카탈로그 (캐시 포함)
pub struct MetadataCatalog {
    source: Arc<dyn MetadataSource>,
    cache: RwLock<HashMap<String, Arc<TableMeta>>>,
}

impl MetadataCatalog {
    /// 새 카탈로그 생성
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// 테이블 메타 조회 (캐시 우선)
    pub async fn table(&self, table: &str) -> Arc<TableMeta> {
        let key = table.trim().to_lowercase();

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(meta) = cache.get(&key) {
                return meta.clone();
            }
        }

        match self.source.load_table(&key).await {
            Ok(mut meta) => {
                meta.table = key.clone();
                meta.columns = meta
                    .columns
                    .into_iter()
                    .map(ColumnDefinition::normalized)
                    .collect();

                tracing::debug!(
                    table = %key,
                    columns = meta.columns.len(),
                    rules = meta.rules.len(),
                    "metadata loaded"
                );

                let meta = Arc::new(meta);
                let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
                cache.insert(key, meta.clone());
                meta
            }
            Err(e) => {
                tracing::warn!(
                    table = %key,
                    error = %e,
                    "metadata lookup failed, treating table as unconfigured"
                );
                Arc::new(TableMeta::unconfigured(key))
            }
        }
    }

    /// 컬럼 정의 목록
    pub async fn column_definitions(&self, table: &str) -> Vec<ColumnDefinition> {
        self.table(table).await.columns.clone()
    }

    /// 테이블 기본 설정
    pub async fn table_defaults(&self, table: &str) -> TableDefaults {
        self.table(table).await.defaults.clone()
    }

    /// 한 테이블의 캐시 무효화
    pub fn invalidate(&self, table: &str) -> bool {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.remove(&table.trim().to_lowercase()).is_some()
    }

    /// 전체 캐시 무효화
    pub fn invalidate_all(&self) -> usize {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        let count = cache.len();
        cache.clear();
        count
    }

    /// 현재 캐시된 테이블 이름
    pub fn cached_tables(&self) -> Vec<String> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = cache.keys().cloned().collect();
        names.sort();
        names
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Static Source
// ─────────────────────────────────────────────────────────────────────────────

/// 메모리 기반 메타데이터 저장소
///
/// YAML 카탈로그 파일, 개발 모드, 테스트에서 사용합니다.
///
/// ```yaml
/// tables:
///   sys_user:
///     primary_key: id
///     default_sort: id ASC
///     columns:
///       - column_name: username
///         required: true
///         query_type: like
///     rules:
///       - check_column: username
///         mode: not_exists
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    tables: HashMap<String, TableMeta>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tables: BTreeMap<String, RawTable>,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(flatten)]
    defaults: TableDefaults,
    #[serde(default)]
    columns: Vec<ColumnDefinition>,
    #[serde(default)]
    rules: Vec<ValidationRule>,
}

impl StaticSource {
    /// 빈 저장소
    pub fn new() -> Self {
        Self::default()
    }

    /// 테이블 추가
    pub fn with_table(mut self, meta: TableMeta) -> Self {
        self.tables.insert(meta.table.to_lowercase(), meta);
        self
    }

    /// YAML 문자열에서 로드
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;

        let tables = file
            .tables
            .into_iter()
            .map(|(name, raw)| {
                let name = name.to_lowercase();
                let columns = raw
                    .columns
                    .into_iter()
                    .map(|mut c| {
                        if c.table_name.is_empty() {
                            c.table_name = name.clone();
                        }
                        c.normalized()
                    })
                    .collect();

                let meta = TableMeta {
                    table: name.clone(),
                    defaults: raw.defaults,
                    columns,
                    rules: raw.rules,
                };
                (name, meta)
            })
            .collect();

        Ok(Self { tables })
    }

    /// YAML 파일에서 로드
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| Error::CatalogFile {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml(&yaml)
    }

    /// 등록된 테이블 이름
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl MetadataSource for StaticSource {
    async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn load_defaults(&self, table: &str) -> Result<TableDefaults> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.defaults.clone())
            .unwrap_or_default())
    }

    async fn load_rules(&self, table: &str) -> Result<Vec<ValidationRule>> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.rules.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::schema::{ColumnType, QueryType};

    const CATALOG: &str = r#"
tables:
  SYS_USER:
    primary_key: id
    default_sort: id ASC
    columns:
      - column_name: UserName
        required: true
        query_type: like
      - column_name: age
        column_type: number
        query_type: range
      - column_name: enabled
        column_type: switch
"#;

    struct CountingSource {
        inner: StaticSource,
        loads: AtomicUsize,
    }

    #[async_trait]
    impl MetadataSource for CountingSource {
        async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_columns(table).await
        }

        async fn load_defaults(&self, table: &str) -> Result<TableDefaults> {
            self.inner.load_defaults(table).await
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MetadataSource for FailingSource {
        async fn load_columns(&self, table: &str) -> Result<Vec<ColumnDefinition>> {
            Err(Error::MetadataUnavailable {
                table: table.to_string(),
                message: "connection refused".to_string(),
            })
        }

        async fn load_defaults(&self, _table: &str) -> Result<TableDefaults> {
            Ok(TableDefaults::default())
        }
    }

    #[tokio::test]
    async fn test_yaml_catalog_is_normalized() {
        let catalog = MetadataCatalog::new(Arc::new(StaticSource::from_yaml(CATALOG).unwrap()));

        let meta = catalog.table("sys_user").await;
        assert!(meta.is_configured());
        assert_eq!(meta.defaults.default_sort.as_deref(), Some("id ASC"));

        let username = meta.column("username").unwrap();
        assert_eq!(username.table_name, "sys_user");
        assert_eq!(username.column_name, "username");
        assert!(username.required);
        assert_eq!(username.query_type, Some(QueryType::Like));

        assert_eq!(meta.column("age").unwrap().column_type, ColumnType::Number);
        assert_eq!(meta.column("enabled").unwrap().column_type, ColumnType::Boolean);
    }

    #[tokio::test]
    async fn test_unknown_table_is_empty() {
        let catalog = MetadataCatalog::new(Arc::new(StaticSource::new()));
        assert!(catalog.column_definitions("nowhere").await.is_empty());
        assert_eq!(catalog.table_defaults("nowhere").await.primary_key, "id");
    }

    #[tokio::test]
    async fn test_cache_and_invalidate() {
        let source = Arc::new(CountingSource {
            inner: StaticSource::from_yaml(CATALOG).unwrap(),
            loads: AtomicUsize::new(0),
        });
        let catalog = MetadataCatalog::new(source.clone());

        catalog.table("sys_user").await;
        catalog.table("SYS_USER").await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.cached_tables(), vec!["sys_user".to_string()]);

        assert!(catalog.invalidate("sys_user"));
        catalog.table("sys_user").await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);

        assert_eq!(catalog.invalidate_all(), 1);
        assert!(catalog.cached_tables().is_empty());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_unconfigured() {
        let catalog = MetadataCatalog::new(Arc::new(FailingSource));

        let meta = catalog.table("orders").await;
        assert!(!meta.is_configured());
        assert_eq!(meta.primary_key(), "id");
        // 실패 결과는 캐시하지 않음
        assert!(catalog.cached_tables().is_empty());
    }

    #[test]
    fn test_missing_file_is_catalog_error() {
        let err = StaticSource::from_file("/nonexistent/catalog.yaml").unwrap_err();
        assert_eq!(err.code(), "CATALOG_FILE_ERROR");
    }
}
