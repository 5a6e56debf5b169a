//! Ingest Routes
//!
//! Endpoints for stations (or the simulator) posting readings over HTTP.
//! Readings go through the same pipeline as MQTT publishes.
//!
//! - POST /api/v1/ingest - Single reading
//! - POST /api/v1/ingest/batch - Batch of readings

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{BatchError, BatchIngestRequest, BatchIngestResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::station::{StationData, StationReading};

/// POST /api/v1/ingest
///
/// Ingest a single reading and return the stored station data.
pub async fn ingest_reading(
    State(state): State<Arc<AppState>>,
    Json(reading): Json<StationReading>,
) -> ApiResult<(StatusCode, Json<StationData>)> {
    let data = state.pipeline.process(reading, None).await?;
    Ok((StatusCode::CREATED, Json(data)))
}

/// POST /api/v1/ingest/batch
///
/// Ingest multiple readings; invalid ones are reported, not fatal.
pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchIngestRequest>,
) -> ApiResult<(StatusCode, Json<BatchIngestResponse>)> {
    if req.readings.is_empty() {
        return Err(ApiError::Validation("readings cannot be empty".to_string()));
    }

    let mut accepted = 0;
    let mut errors = Vec::new();

    for (index, reading) in req.readings.into_iter().enumerate() {
        match state.pipeline.process(reading, None).await {
            Ok(_) => accepted += 1,
            Err(e) => errors.push(BatchError {
                index,
                error: e.to_string(),
            }),
        }
    }

    let rejected = errors.len();
    let status = if rejected == 0 { "ok" } else { "partial" };

    tracing::info!(accepted, rejected, "Batch ingest complete");

    Ok((
        StatusCode::CREATED,
        Json(BatchIngestResponse {
            status: status.to_string(),
            accepted,
            rejected,
            errors,
        }),
    ))
}
