//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::agro::{AgroResult, CropModel};
use crate::config::{ApiConfig, Config};
use crate::ingest::{IngestPipeline, MqttStatus};
use crate::notify::DryAlert;
use crate::station::StationRegistry;
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Ingestion pipeline shared with the MQTT listener
    pub pipeline: Arc<IngestPipeline>,
    /// Latest data per station
    pub registry: Arc<StationRegistry>,
    /// WebSocket connection hub for dashboards
    pub ws_hub: Arc<ConnectionHub>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Broker connection state, when the MQTT listener runs
    pub mqtt: Option<MqttStatus>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        pipeline: Arc<IngestPipeline>,
        registry: Arc<StationRegistry>,
        ws_hub: Arc<ConnectionHub>,
        config: ApiConfig,
    ) -> Self {
        Self {
            pipeline,
            registry,
            ws_hub,
            config: Arc::new(config),
            mqtt: None,
            start_time: Instant::now(),
        }
    }

    /// Build the model, registry, hub and pipeline from the configuration
    pub fn from_config(config: &Config, alert: Option<Arc<DryAlert>>) -> AgroResult<Self> {
        let model = Arc::new(CropModel::new(config.crop.clone())?);
        let registry = Arc::new(StationRegistry::new(config.stations.history_capacity));
        let ws_hub = Arc::new(ConnectionHub::new(HubConfig {
            max_connections: config.api.max_connections,
        }));
        let mut pipeline = IngestPipeline::new(
            model,
            Arc::clone(&registry),
            Arc::clone(&ws_hub),
            config.stations.default_id,
        );
        if let Some(alert) = alert {
            pipeline = pipeline.with_alert(alert);
        }
        let pipeline = Arc::new(pipeline);

        Ok(Self::new(pipeline, registry, ws_hub, config.api.clone()))
    }

    /// Report the MQTT listener state in health checks
    pub fn with_mqtt_status(mut self, status: MqttStatus) -> Self {
        self.mqtt = Some(status);
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
