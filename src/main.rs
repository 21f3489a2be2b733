use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use carbon_cycle_backend::config::load_config;
use carbon_cycle_backend::core::cache::CacheManager;
use carbon_cycle_backend::core::error::AppError;
use carbon_cycle_backend::features::earth_engine::{EarthEngineClient, GeoDataSource};
use carbon_cycle_backend::features::metrics::{
    MetricsService, handle_ndvi, handle_rainfall, handle_root,
};
use carbon_cycle_backend::server::AppState;

const CACHE_CAPACITY: u64 = 1024;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = Arc::new(load_config()?);
    let cache_manager = CacheManager::new(config.cache_enabled, CACHE_CAPACITY);

    let engine_client = Arc::new(EarthEngineClient::new(config.clone())?);
    if !engine_client.has_credentials() {
        tracing::warn!(
            path = %config.ee_credentials_path,
            "Earth Engine credentials not found; queries will fail until authentication is set up"
        );
    }

    let data_source: Arc<dyn GeoDataSource> = engine_client;
    let metrics_service = Arc::new(MetricsService::new(
        config.clone(),
        data_source,
        cache_manager,
    ));
    let app_state = AppState::new(metrics_service);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/api/ndvi", get(handle_ndvi))
        .route("/api/rainfall", get(handle_rainfall))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "starting server");
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::internal(format!("failed to bind: {err}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|err| AppError::internal(format!("server error: {err}")))?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_target(false)
        .init();
}
