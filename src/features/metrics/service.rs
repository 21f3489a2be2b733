use std::sync::Arc;

use tracing::debug;

use crate::config::AppConfig;
use crate::core::cache::CacheManager;
use crate::core::error::AppError;
use crate::features::earth_engine::GeoDataSource;
use crate::features::metrics::dto::PointQuery;

// First full calendar years of record for each dataset.
const SENTINEL2_FIRST_YEAR: i32 = 2015;
const CHIRPS_FIRST_YEAR: i32 = 1981;

pub struct MetricsService {
    config: Arc<AppConfig>,
    data_source: Arc<dyn GeoDataSource>,
    cache: CacheManager,
}

impl MetricsService {
    pub fn new(
        config: Arc<AppConfig>,
        data_source: Arc<dyn GeoDataSource>,
        cache: CacheManager,
    ) -> Self {
        Self {
            config,
            data_source,
            cache,
        }
    }

    pub async fn ndvi(&self, query: PointQuery) -> Result<f64, AppError> {
        validate_point(query.lat, query.lon)?;
        validate_year(query.year, SENTINEL2_FIRST_YEAR, "Sentinel-2")?;

        let cache_key = cache_key("ndvi", &query);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        let value = self
            .data_source
            .ndvi_at_point(query.lat, query.lon, query.year)
            .await?;
        let value = unwrap_or_zero(value, "ndvi", &query);

        self.cache
            .insert(cache_key, value, self.config.cache_ttl.ndvi)
            .await;

        Ok(value)
    }

    pub async fn rainfall(&self, query: PointQuery) -> Result<f64, AppError> {
        validate_point(query.lat, query.lon)?;
        validate_year(query.year, CHIRPS_FIRST_YEAR, "CHIRPS")?;

        let cache_key = cache_key("rainfall", &query);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        let value = self
            .data_source
            .rainfall_at_point(query.lat, query.lon, query.year)
            .await?;
        let value = unwrap_or_zero(value, "rainfall", &query);

        self.cache
            .insert(cache_key, value, self.config.cache_ttl.rainfall)
            .await;

        Ok(value)
    }
}

fn validate_point(lat: f64, lon: f64) -> Result<(), AppError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::bad_request(format!(
            "latitude must be within [-90, 90], received {lat}"
        )));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(AppError::bad_request(format!(
            "longitude must be within [-180, 180], received {lon}"
        )));
    }
    Ok(())
}

fn validate_year(year: i32, first_year: i32, dataset: &str) -> Result<(), AppError> {
    if year < first_year {
        return Err(AppError::bad_request(format!(
            "{dataset} records start in {first_year}, received year {year}"
        )));
    }
    Ok(())
}

fn cache_key(metric: &str, query: &PointQuery) -> String {
    format!("{metric}:{:.6}:{:.6}:{}", query.lat, query.lon, query.year)
}

fn unwrap_or_zero(value: Option<f64>, metric: &str, query: &PointQuery) -> f64 {
    match value {
        Some(value) => value,
        None => {
            debug!(
                metric,
                lat = query.lat,
                lon = query.lon,
                year = query.year,
                "no value at point, substituting 0.0"
            );
            0.0
        }
    }
}
