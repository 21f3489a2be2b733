use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;

use crate::config::AppConfig;
use crate::core::error::AppError;
use crate::core::http_client::build_http_client;
use crate::features::earth_engine::auth::TokenProvider;
use crate::features::earth_engine::expression;

const EARTH_ENGINE_BASE: &str = "https://earthengine.googleapis.com/v1";
const RETRY_ATTEMPTS: usize = 3;
const RETRY_DELAY_MS: u64 = 500;

/// Seam between the metrics service and the remote engine so tests can swap
/// in a mock upstream.
#[async_trait]
pub trait GeoDataSource: Send + Sync {
    /// NDVI of the least-cloudy scene covering the point in `year`, or `None`
    /// when the pixel is masked or no imagery exists.
    async fn ndvi_at_point(&self, lat: f64, lon: f64, year: i32)
    -> Result<Option<f64>, AppError>;

    /// Total rainfall in millimetres at the point over `year`, or `None` when
    /// the point falls outside the dataset's coverage.
    async fn rainfall_at_point(
        &self,
        lat: f64,
        lon: f64,
        year: i32,
    ) -> Result<Option<f64>, AppError>;
}

/// REST binding to the engine's server-side expression evaluator.
pub struct EarthEngineClient {
    config: Arc<AppConfig>,
    http_client: reqwest::Client,
    tokens: TokenProvider,
}

impl EarthEngineClient {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, AppError> {
        let http_client = build_http_client(config.disable_proxy)
            .map_err(|err| AppError::internal(format!("failed to build HTTP client: {err}")))?;

        let credentials = TokenProvider::load_credentials(&config.ee_credentials_path);
        let tokens = TokenProvider::new(credentials, http_client.clone());

        Ok(Self {
            config,
            http_client,
            tokens,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.tokens.has_credentials()
    }

    async fn compute_value(&self, body: Value) -> Result<Option<f64>, AppError> {
        let url = format!(
            "{EARTH_ENGINE_BASE}/projects/{}/value:compute",
            self.config.ee_project
        );
        let token = self.tokens.access_token().await?;

        let mut last_error: Option<AppError> = None;

        for attempt in 0..RETRY_ATTEMPTS {
            let response = self
                .http_client
                .post(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let payload = resp.json::<Value>().await.map_err(|err| {
                        AppError::internal(format!("failed to parse compute response: {err}"))
                    })?;
                    return extract_scalar(&payload);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "<failed to read body>".to_string());
                    let snippet = text.chars().take(512).collect::<String>();
                    last_error = Some(AppError::upstream(format!(
                        "compute request failed with {status}: {snippet}"
                    )));
                }
                Err(err) => {
                    last_error = Some(AppError::upstream(format!(
                        "network error contacting {url}: {err}"
                    )));
                }
            }

            if attempt < RETRY_ATTEMPTS - 1 {
                sleep(Duration::from_millis(RETRY_DELAY_MS * (attempt as u64 + 1))).await;
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::internal("compute request failed".to_string())))
    }
}

#[async_trait]
impl GeoDataSource for EarthEngineClient {
    async fn ndvi_at_point(
        &self,
        lat: f64,
        lon: f64,
        year: i32,
    ) -> Result<Option<f64>, AppError> {
        let body = expression::ndvi_at_point(lat, lon, year);
        self.compute_value(body).await
    }

    async fn rainfall_at_point(
        &self,
        lat: f64,
        lon: f64,
        year: i32,
    ) -> Result<Option<f64>, AppError> {
        let body = expression::annual_rainfall_at_point(lat, lon, year);
        self.compute_value(body).await
    }
}

// A masked pixel comes back as a null result rather than an error.
fn extract_scalar(payload: &Value) -> Result<Option<f64>, AppError> {
    match payload.get("result") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            AppError::internal(format!("unexpected compute result type: {value}"))
        }),
    }
}
