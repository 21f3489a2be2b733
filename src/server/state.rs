use std::sync::Arc;

use crate::features::metrics::MetricsService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MetricsService>,
}

impl AppState {
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }
}
