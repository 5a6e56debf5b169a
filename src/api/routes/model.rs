//! Model Routes
//!
//! - POST /api/v1/model/estimate - Run the crop model on ad-hoc inputs

use axum::{extract::State, http::StatusCode, Json};
use chrono::Local;
use std::sync::Arc;

use crate::agro::{CropModel, ModelInputs};
use crate::api::dto::{EstimateRequest, EstimateResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::station::parse_collected_at;

/// POST /api/v1/model/estimate
///
/// Uses the server's crop unless the request carries its own parameters.
/// Nothing is recorded or broadcast.
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EstimateRequest>,
) -> ApiResult<(StatusCode, Json<EstimateResponse>)> {
    let date = match req.collected_at.as_deref() {
        Some(text) => {
            parse_collected_at(text).map_err(|e| ApiError::Validation(e.to_string()))?
        }
        None => Local::now().naive_local(),
    };

    let inputs = ModelInputs {
        soil_moisture: req.soil_moisture,
        temperature: req.temperature,
        illuminance: req.illuminance,
        date,
    };

    let custom;
    let model = match req.crop {
        Some(params) => {
            custom = CropModel::new(params)?;
            &custom
        }
        None => state.pipeline.model(),
    };

    let estimate = model.estimate(&inputs)?;
    let params = model.parameters();

    Ok((
        StatusCode::OK,
        Json(EstimateResponse {
            culture: params.culture.clone(),
            unit: params.unit.symbol().to_string(),
            date,
            estimate,
        }),
    ))
}
