//! Health Routes
//!
//! Health check endpoints for monitoring and container probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (broker connected, if enabled)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Stations only reach the server through the broker, so a lost
/// broker connection means the server is not ready.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match &state.mqtt {
        Some(status) if !status.is_connected() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (mqtt, status) = match &state.mqtt {
        None => ("disabled", "healthy"),
        Some(s) if s.is_connected() => ("connected", "healthy"),
        Some(_) => ("disconnected", "degraded"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        mqtt: mqtt.to_string(),
        stations: state.registry.station_count().await,
        connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
