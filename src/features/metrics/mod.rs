pub mod dto;
pub mod handler;
pub mod service;

pub use dto::{DEFAULT_YEAR, NdviResponse, PointQuery, RainfallResponse};
pub use handler::{handle_ndvi, handle_rainfall, handle_root};
pub use service::MetricsService;
