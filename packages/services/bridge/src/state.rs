//! Bridge 앱 상태

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use mcrud_core::{MetadataCatalog, MetadataSource, StaticSource};
use mcrud_data::{DataService, DataStore};

use crate::config::Config;
use crate::meta::PgMetadataSource;
use crate::store::PgStore;

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 데이터 서비스
    pub service: DataService,
}

impl AppState {
    /// 새 상태 생성
    ///
    /// 카탈로그 파일이 있으면 정적 카탈로그를, 없으면 DB 카탈로그 테이블을 사용합니다.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("failed to connect database")?;

        let source: Arc<dyn MetadataSource> = match &config.catalog_file {
            Some(path) => {
                let source = StaticSource::from_file(path)?;
                tracing::info!(path = %path, tables = ?source.table_names(), "static catalog loaded");
                Arc::new(source)
            }
            None => Arc::new(PgMetadataSource::new(pool.clone())),
        };

        let store: Arc<dyn DataStore> = Arc::new(PgStore::new(pool, config.query_timeout()));

        Ok(Self::with_parts(config.clone(), source, store))
    }

    /// 구성 요소로 직접 생성
    pub fn with_parts(
        config: Config,
        source: Arc<dyn MetadataSource>,
        store: Arc<dyn DataStore>,
    ) -> Self {
        let catalog = Arc::new(MetadataCatalog::new(source));
        let service =
            DataService::new(catalog, store).with_default_page_size(config.default_page_size);
        Self { config, service }
    }

    /// 메타데이터 카탈로그
    pub fn catalog(&self) -> &MetadataCatalog {
        self.service.catalog()
    }
}
