use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use super::error::ApiError;
use crate::core::rates::{ConversionRequest, ConversionResult, RateSnapshot};
use crate::service::RateService;

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ConversionResult,
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Currency Converter API is running",
    }))
}

/// GET /api/currencies
pub async fn currencies(State(service): State<Arc<RateService>>) -> Result<Json<Value>, ApiError> {
    let symbols = service.get_symbols().await?;
    Ok(Json(json!({ "success": true, "symbols": symbols })))
}

/// GET /api/rates, the snapshot exactly as cached.
pub async fn rates(
    State(service): State<Arc<RateService>>,
) -> Result<Json<RateSnapshot>, ApiError> {
    Ok(Json(service.get_rates().await?))
}

/// POST /api/convert
pub async fn convert(
    State(service): State<Arc<RateService>>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        debug!(error = %e, "Rejected convert body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let result = service.convert(&req).await?;
    Ok(Json(ConvertResponse {
        success: true,
        result,
    }))
}
