//! Station Routes
//!
//! - GET /api/v1/stations - Latest data of every station
//! - GET /api/v1/stations/:id - Latest data of one station
//! - GET /api/v1/stations/:id/history - Recent readings of one station

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{HistoryQuery, HistoryResponse, StationsResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::station::{StationData, StationId};

/// GET /api/v1/stations
pub async fn list_stations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<StationsResponse>)> {
    let stations = state.registry.list().await;
    let count = stations.len();
    Ok((StatusCode::OK, Json(StationsResponse { stations, count })))
}

/// GET /api/v1/stations/:id
pub async fn get_station(
    State(state): State<Arc<AppState>>,
    Path(id): Path<StationId>,
) -> ApiResult<(StatusCode, Json<StationData>)> {
    let data = state
        .registry
        .latest(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("station {} has not reported", id)))?;
    Ok((StatusCode::OK, Json(data)))
}

/// GET /api/v1/stations/:id/history?limit=N
pub async fn station_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<StationId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<(StatusCode, Json<HistoryResponse>)> {
    if query.limit == Some(0) {
        return Err(ApiError::Validation("limit must be positive".to_string()));
    }

    let readings = state
        .registry
        .history(id, query.limit)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("station {} has not reported", id)))?;
    Ok((StatusCode::OK, Json(HistoryResponse { id, readings })))
}
