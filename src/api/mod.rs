//! LabMet REST API
//!
//! HTTP API layer for the station server, built with Axum.
//!
//! # Endpoints
//!
//! ## Ingest
//! - `POST /api/v1/ingest` - Single station reading
//! - `POST /api/v1/ingest/batch` - Batch of readings
//!
//! ## Stations
//! - `GET /api/v1/stations` - Latest data of every station
//! - `GET /api/v1/stations/:id` - Latest data of one station
//! - `GET /api/v1/stations/:id/history` - Recent readings
//!
//! ## Agronomy
//! - `GET /api/v1/cultures` - Reference tables
//! - `GET /api/v1/cultures/:name` - One culture
//! - `POST /api/v1/model/estimate` - Ad-hoc productivity estimate
//! - `POST /api/v1/water-balance` - Sequential water balance
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Real-time station data
//!
//! When `ui_dir` is configured, every other path serves the dashboard.

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let api_routes = Router::new()
        // Ingest routes
        .route("/ingest", post(routes::ingest::ingest_reading))
        .route("/ingest/batch", post(routes::ingest::ingest_batch))
        // Station routes
        .route("/stations", get(routes::stations::list_stations))
        .route("/stations/:id", get(routes::stations::get_station))
        .route("/stations/:id/history", get(routes::stations::station_history))
        // Agronomy routes
        .route("/cultures", get(routes::cultures::list_cultures))
        .route("/cultures/:name", get(routes::cultures::get_culture))
        .route("/model/estimate", post(routes::model::estimate))
        .route("/water-balance", post(routes::water_balance::run_water_balance))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(shared_state);

    match &config.ui_dir {
        Some(dir) => {
            let index = Path::new(dir).join("index.html");
            router.fallback_service(ServeDir::new(dir).not_found_service(ServeFile::new(index)))
        }
        None => router,
    }
}

/// Permissive CORS unless origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("LabMet API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("LabMet API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{
        BatchIngestResponse, EstimateResponse, HealthResponse, HistoryResponse,
        StationsResponse, WaterBalanceResponse,
    };
    use crate::config::Config;
    use crate::ingest::MqttStatus;
    use crate::station::StationData;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    const READING: &str = r#"{
        "id": 3,
        "collected_at": "06/15/2016T13:45:10",
        "ds18b20_temp": 18.0,
        "dht22_temp": 18.4,
        "dht22_humid": 60.0,
        "bh1750_illuminance": 800,
        "analog_soil_moisture": 25.0
    }"#;

    fn create_test_state() -> AppState {
        AppState::from_config(&Config::default(), None).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = build_router(create_test_state());
        let response = app.oneshot(get("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_without_broker() {
        let app = build_router(create_test_state());
        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_broker_down() {
        let state = create_test_state().with_mqtt_status(MqttStatus::default());
        let app = build_router(state);
        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_full() {
        let state = create_test_state().with_mqtt_status(MqttStatus::default());
        let app = build_router(state);
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = json(response).await;
        assert_eq!(health.status, "degraded");
        assert_eq!(health.mqtt, "disconnected");
        assert_eq!(health.stations, 0);
        assert_eq!(health.connections, 0);
    }

    #[tokio::test]
    async fn test_ingest_then_query_station() {
        let state = create_test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/ingest", READING))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: StationData = json(response).await;
        assert_eq!(created.id, 3);
        assert!(created.estimate.potential_productivity > 0.0);

        let response = app.clone().oneshot(get("/api/v1/stations/3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let latest: StationData = json(response).await;
        assert_eq!(latest, created);

        let response = app.clone().oneshot(get("/api/v1/stations")).await.unwrap();
        let list: StationsResponse = json(response).await;
        assert_eq!(list.count, 1);

        let response = app
            .oneshot(get("/api/v1/stations/3/history?limit=5"))
            .await
            .unwrap();
        let history: HistoryResponse = json(response).await;
        assert_eq!(history.id, 3);
        assert_eq!(history.readings.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_station() {
        let app = build_router(create_test_state());
        let response = app.oneshot(get("/api/v1/stations/42")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_history_zero_limit() {
        let app = build_router(create_test_state());
        let response = app
            .oneshot(get("/api/v1/stations/1/history?limit=0"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_invalid_json() {
        let app = build_router(create_test_state());
        let response = app
            .oneshot(post_json("/api/v1/ingest", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_out_of_range_humidity() {
        let app = build_router(create_test_state());
        let body = READING.replace("\"dht22_humid\": 60.0", "\"dht22_humid\": 140.0");
        let response = app.oneshot(post_json("/api/v1/ingest", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ingest_batch_partial() {
        let app = build_router(create_test_state());
        let bad = READING.replace("06/15/2016T13:45:10", "yesterday");
        let body = format!(r#"{{"readings": [{}, {}]}}"#, READING, bad);

        let response = app
            .oneshot(post_json("/api/v1/ingest/batch", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let batch: BatchIngestResponse = json(response).await;
        assert_eq!(batch.status, "partial");
        assert_eq!(batch.accepted, 1);
        assert_eq!(batch.rejected, 1);
        assert_eq!(batch.errors[0].index, 1);
    }

    #[tokio::test]
    async fn test_cultures() {
        let app = build_router(create_test_state());

        let response = app.clone().oneshot(get("/api/v1/cultures")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(get("/api/v1/cultures/Potato?relative_humidity=80&wind_speed=2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = json(response).await;
        assert_eq!(body["culture"], "potato");
        assert!(body["harvest"].is_object());

        let response = app.oneshot(get("/api/v1/cultures/kale")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_model_estimate() {
        let app = build_router(create_test_state());
        let response = app
            .oneshot(post_json(
                "/api/v1/model/estimate",
                r#"{"soil_moisture": 25.0, "temperature": 18.0, "illuminance": 800,
                    "collected_at": "06/15/2016T13:45:10"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let estimate: EstimateResponse = json(response).await;
        assert_eq!(estimate.culture, "potato");
        assert_eq!(estimate.unit, "kg/ha");
        assert!(estimate.estimate.potential_productivity > 0.0);
    }

    #[tokio::test]
    async fn test_model_estimate_unknown_culture() {
        let app = build_router(create_test_state());
        let response = app
            .oneshot(post_json(
                "/api/v1/model/estimate",
                r#"{"soil_moisture": 25.0, "temperature": 18.0, "illuminance": 800,
                    "crop": {"culture": "kale"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_water_balance() {
        let app = build_router(create_test_state());
        let response = app
            .oneshot(post_json(
                "/api/v1/water-balance",
                r#"{"awc": 100, "periods": [
                    {"precipitation": 120, "pet": 40},
                    {"precipitation": 20, "pet": 30}
                ]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let table: WaterBalanceResponse = json(response).await;
        assert_eq!(table.awc, 100.0);
        assert_eq!(table.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_water_balance_rejects_empty() {
        let app = build_router(create_test_state());
        let response = app
            .oneshot(post_json("/api/v1/water-balance", r#"{"periods": []}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cors_layer_ignores_bad_origins() {
        let _ = cors_layer(&["http://localhost:8080".to_string(), "\n".to_string()]);
        let _ = cors_layer(&[]);
    }
}
