use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use carbon_cycle_backend::config::{AppConfig, CacheTtlConfig};
use carbon_cycle_backend::core::cache::CacheManager;
use carbon_cycle_backend::core::error::AppError;
use carbon_cycle_backend::features::earth_engine::GeoDataSource;
use carbon_cycle_backend::features::metrics::{DEFAULT_YEAR, MetricsService, PointQuery};

struct MockGeoDataSource {
    ndvi: Result<Option<f64>, String>,
    rainfall: Result<Option<f64>, String>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockGeoDataSource {
    fn new(ndvi: Result<Option<f64>, String>, rainfall: Result<Option<f64>, String>) -> Self {
        Self {
            ndvi,
            rainfall,
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn record_call(&self, key: &str) {
        let mut guard = self.calls.lock().await;
        *guard.entry(key.to_string()).or_insert(0) += 1;
    }

    async fn count_for(&self, key: &str) -> usize {
        let guard = self.calls.lock().await;
        guard.get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl GeoDataSource for MockGeoDataSource {
    async fn ndvi_at_point(
        &self,
        _lat: f64,
        _lon: f64,
        _year: i32,
    ) -> Result<Option<f64>, AppError> {
        self.record_call("ndvi").await;
        self.ndvi
            .clone()
            .map_err(|message| AppError::upstream(message))
    }

    async fn rainfall_at_point(
        &self,
        _lat: f64,
        _lon: f64,
        _year: i32,
    ) -> Result<Option<f64>, AppError> {
        self.record_call("rainfall").await;
        self.rainfall
            .clone()
            .map_err(|message| AppError::upstream(message))
    }
}

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        port: 0,
        ee_project: "test-project".to_string(),
        ee_credentials_path: "/nonexistent/credentials".to_string(),
        disable_proxy: false,
        cache_enabled: true,
        cache_ttl: CacheTtlConfig {
            ndvi: 3600,
            rainfall: 3600,
        },
    })
}

fn service_with(mock: Arc<MockGeoDataSource>, cache_enabled: bool) -> MetricsService {
    let data_source: Arc<dyn GeoDataSource> = mock;
    MetricsService::new(
        test_config(),
        data_source,
        CacheManager::new(cache_enabled, 64),
    )
}

fn query(lat: f64, lon: f64, year: i32) -> PointQuery {
    PointQuery { lat, lon, year }
}

#[tokio::test]
async fn ndvi_passes_through_computed_value() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(Some(0.63)), Ok(Some(812.4))));
    let service = service_with(mock, true);

    let value = service
        .ndvi(query(51.5, -0.12, 2024))
        .await
        .expect("ndvi value");
    assert_eq!(value, 0.63);
}

#[tokio::test]
async fn rainfall_passes_through_computed_value() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(Some(0.63)), Ok(Some(812.4))));
    let service = service_with(mock, true);

    let value = service
        .rainfall(query(-1.28, 36.82, 2023))
        .await
        .expect("rainfall value");
    assert_eq!(value, 812.4);
}

#[tokio::test]
async fn masked_pixel_yields_zero_not_error() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(None), Ok(None)));
    let service = service_with(mock, true);

    let ndvi = service.ndvi(query(51.5, -0.12, 2024)).await.expect("ndvi");
    assert_eq!(ndvi, 0.0);

    let rainfall = service
        .rainfall(query(51.5, -0.12, 2024))
        .await
        .expect("rainfall");
    assert_eq!(rainfall, 0.0);
}

#[tokio::test]
async fn upstream_failure_propagates_as_upstream_error() {
    let mock = Arc::new(MockGeoDataSource::new(
        Err("no imagery found".to_string()),
        Ok(Some(1.0)),
    ));
    let service = service_with(mock, true);

    let result = service.ndvi(query(51.5, -0.12, 2024)).await;
    match result {
        Err(AppError::Upstream(message)) => assert!(message.contains("no imagery found")),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn rejects_out_of_range_coordinates() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(Some(0.5)), Ok(Some(1.0))));
    let service = service_with(mock.clone(), true);

    let result = service.ndvi(query(91.0, 0.0, 2024)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = service.rainfall(query(0.0, 200.0, 2024)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    assert_eq!(mock.count_for("ndvi").await, 0);
    assert_eq!(mock.count_for("rainfall").await, 0);
}

#[tokio::test]
async fn rejects_years_before_dataset_record() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(Some(0.5)), Ok(Some(1.0))));
    let service = service_with(mock, true);

    let result = service.ndvi(query(0.0, 0.0, 2014)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = service.rainfall(query(0.0, 0.0, 1980)).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // CHIRPS reaches further back than Sentinel-2.
    let rainfall = service
        .rainfall(query(0.0, 0.0, 1995))
        .await
        .expect("rainfall");
    assert_eq!(rainfall, 1.0);
}

#[tokio::test]
async fn repeated_queries_hit_the_cache() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(Some(0.5)), Ok(Some(420.0))));
    let service = service_with(mock.clone(), true);

    let first = service.ndvi(query(10.0, 20.0, 2024)).await.expect("first");
    let second = service.ndvi(query(10.0, 20.0, 2024)).await.expect("second");
    assert_eq!(first, second);
    assert_eq!(mock.count_for("ndvi").await, 1);

    // A different year is a different point query.
    service.ndvi(query(10.0, 20.0, 2025)).await.expect("third");
    assert_eq!(mock.count_for("ndvi").await, 2);
}

#[tokio::test]
async fn disabled_cache_queries_upstream_every_time() {
    let mock = Arc::new(MockGeoDataSource::new(Ok(Some(0.5)), Ok(Some(420.0))));
    let service = service_with(mock.clone(), false);

    service.rainfall(query(10.0, 20.0, 2024)).await.expect("first");
    service.rainfall(query(10.0, 20.0, 2024)).await.expect("second");
    assert_eq!(mock.count_for("rainfall").await, 2);
}

#[test]
fn year_defaults_to_2025_when_omitted() {
    let parsed: PointQuery =
        serde_json::from_value(json!({ "lat": 51.5, "lon": -0.12 })).expect("query parse");
    assert_eq!(parsed.year, DEFAULT_YEAR);
    assert_eq!(parsed.year, 2025);
}
