use serde::{Deserialize, Serialize};

pub const DEFAULT_YEAR: i32 = 2025;

fn default_year() -> i32 {
    DEFAULT_YEAR
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_year")]
    pub year: i32,
}

#[derive(Debug, Serialize)]
pub struct NdviResponse {
    pub ndvi: f64,
}

#[derive(Debug, Serialize)]
pub struct RainfallResponse {
    pub rainfall: f64,
}
