use axum::Json;
use axum::extract::{Query, State};
use serde_json::{Value, json};

use crate::core::error::AppError;
use crate::features::metrics::dto::{NdviResponse, PointQuery, RainfallResponse};
use crate::server::AppState;

pub async fn handle_root() -> Json<Value> {
    Json(json!({ "message": "Carbon Cycle Connect backend is running" }))
}

pub async fn handle_ndvi(
    State(state): State<AppState>,
    Query(query): Query<PointQuery>,
) -> Result<Json<NdviResponse>, AppError> {
    let ndvi = state.service.ndvi(query).await?;
    Ok(Json(NdviResponse { ndvi }))
}

pub async fn handle_rainfall(
    State(state): State<AppState>,
    Query(query): Query<PointQuery>,
) -> Result<Json<RainfallResponse>, AppError> {
    let rainfall = state.service.rainfall(query).await?;
    Ok(Json(RainfallResponse { rainfall }))
}
