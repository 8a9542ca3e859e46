//! mcrud Bridge
//!
//! 메타데이터 기반 범용 CRUD를 HTTP로 노출합니다.
//! `/api/common/*` 엔드포인트가 `targetTable`로 지정한 임의의 테이블을 다룹니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod meta;
mod middleware;
mod state;
mod store;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "mcrud_bridge=debug,mcrud_data=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        max_connections = config.max_connections,
        default_page_size = config.default_page_size,
        query_timeout_secs = config.query_timeout_secs,
        catalog_file = ?config.catalog_file,
        disable_context = config.disable_context,
        context_fields = ?config.context_fields,
        "Starting Bridge"
    );

    // 앱 상태 초기화
    let state = AppState::new(&config).await?;
    let state = Arc::new(state);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Bridge listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Generic CRUD
        .route("/api/common/list", get(handlers::common::list))
        .route("/api/common/save", post(handlers::common::save))
        .route("/api/common/batchSave", post(handlers::common::batch_save))
        .route("/api/common/delete", post(handlers::common::delete))
        .route("/api/common/batchDelete", post(handlers::common::batch_delete))
        // Catalog
        .route("/api/meta/refresh", post(handlers::meta::refresh))
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}
