//! Water Balance Routes
//!
//! - POST /api/v1/water-balance - Sequential Thornthwaite-Mather balance

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::agro::WaterBalance;
use crate::api::dto::{WaterBalanceRequest, WaterBalanceResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/water-balance
///
/// Runs the periods in order. The AWC defaults to the server crop's.
pub async fn run_water_balance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WaterBalanceRequest>,
) -> ApiResult<(StatusCode, Json<WaterBalanceResponse>)> {
    if req.periods.is_empty() {
        return Err(ApiError::Validation("periods cannot be empty".to_string()));
    }

    let awc = req
        .awc
        .unwrap_or_else(|| state.pipeline.model().parameters().awc);
    let steps = WaterBalance::run(awc, req.initial_storage, &req.periods)?;

    Ok((StatusCode::OK, Json(WaterBalanceResponse { awc, steps })))
}
