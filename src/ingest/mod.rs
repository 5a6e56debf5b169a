//! Station Ingestion
//!
//! Every reading, whether it arrives over MQTT or the REST API, goes
//! through the same pipeline:
//!
//! 1. validate the payload
//! 2. resolve the station id (payload `id`, numeric last topic segment,
//!    configured default)
//! 3. run the crop model
//! 4. record the data in the registry
//! 5. push a `station_data` event on `stations.<id>`
//! 6. evaluate the dry soil alert

mod mqtt;

use chrono::{Local, Utc};
use std::sync::Arc;
use thiserror::Error;

pub use mqtt::{MqttListener, MqttStatus};

use crate::agro::{AgroError, CropModel};
use crate::notify::DryAlert;
use crate::station::{ReadingError, StationData, StationId, StationReading, StationRegistry};
use crate::websocket::{ConnectionHub, WsEvent};

/// Errors raised while ingesting a reading
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ReadingError),

    #[error("Crop model failed: {0}")]
    Model(#[from] AgroError),
}

/// Shared ingestion pipeline
pub struct IngestPipeline {
    model: Arc<CropModel>,
    registry: Arc<StationRegistry>,
    hub: Arc<ConnectionHub>,
    alert: Option<Arc<DryAlert>>,
    default_station_id: StationId,
}

impl IngestPipeline {
    pub fn new(
        model: Arc<CropModel>,
        registry: Arc<StationRegistry>,
        hub: Arc<ConnectionHub>,
        default_station_id: StationId,
    ) -> Self {
        Self {
            model,
            registry,
            hub,
            alert: None,
            default_station_id,
        }
    }

    /// Enable the dry soil alert
    pub fn with_alert(mut self, alert: Arc<DryAlert>) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn model(&self) -> &CropModel {
        &self.model
    }

    /// Decode a raw payload and process it
    pub async fn process_payload(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<StationData, IngestError> {
        let reading: StationReading = serde_json::from_slice(payload)?;
        self.process(reading, Some(topic)).await
    }

    /// Process one reading
    pub async fn process(
        &self,
        reading: StationReading,
        topic: Option<&str>,
    ) -> Result<StationData, IngestError> {
        reading.validate()?;

        let id = resolve_station_id(reading.id, topic, self.default_station_id);
        let inputs = reading.model_inputs(Local::now().naive_local())?;
        let estimate = self.model.estimate(&inputs)?;
        let data = StationData::new(id, reading, estimate, Utc::now().timestamp_millis());

        self.registry.record(data.clone()).await;
        let subscribers = self.hub.publish(WsEvent::station_data(data.clone())).await;

        tracing::debug!(
            station_id = id,
            potential = estimate.potential_productivity,
            obtainable = estimate.obtainable_productivity,
            subscribers,
            "Station data ingested"
        );

        if let Some(alert) = &self.alert {
            let alert = Arc::clone(alert);
            let checked = data.clone();
            tokio::spawn(async move {
                if let Err(e) = alert.check(&checked).await {
                    tracing::warn!(station_id = checked.id, error = %e, "Dry soil alert failed");
                }
            });
        }

        Ok(data)
    }

    /// Broadcast a system notice to dashboards
    pub async fn system_notice(&self, message: &str) {
        self.hub.publish(WsEvent::system(message)).await;
    }
}

/// Station id from the payload, else the numeric last topic segment,
/// else the default
pub fn resolve_station_id(
    payload_id: Option<StationId>,
    topic: Option<&str>,
    default: StationId,
) -> StationId {
    payload_id
        .or_else(|| {
            topic
                .and_then(|t| t.rsplit('/').next())
                .and_then(|segment| segment.parse().ok())
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agro::CropParameters;
    use crate::websocket::{HubConfig, ServerMessage};
    use tokio::sync::mpsc;

    const PAYLOAD: &str = r#"{
        "collected_at": "06/15/2016T13:45:10",
        "ds18b20_temp": 18.0,
        "dht22_humid": 60.0,
        "bh1750_illuminance": 800,
        "analog_soil_moisture": 25.0
    }"#;

    fn pipeline() -> (IngestPipeline, Arc<StationRegistry>, Arc<ConnectionHub>) {
        let model = Arc::new(CropModel::new(CropParameters::default()).unwrap());
        let registry = Arc::new(StationRegistry::default());
        let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
        let pipeline = IngestPipeline::new(model, Arc::clone(&registry), Arc::clone(&hub), 1);
        (pipeline, registry, hub)
    }

    #[test]
    fn test_resolve_station_id() {
        assert_eq!(resolve_station_id(Some(4), Some("weather_data/7"), 1), 4);
        assert_eq!(resolve_station_id(None, Some("weather_data/7"), 1), 7);
        assert_eq!(resolve_station_id(None, Some("weather_data"), 1), 1);
        assert_eq!(resolve_station_id(None, Some("weather_data/north"), 2), 2);
        assert_eq!(resolve_station_id(None, None, 3), 3);
    }

    #[tokio::test]
    async fn test_process_payload_records_and_publishes() {
        let (pipeline, registry, hub) = pipeline();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = hub.register(tx).await.unwrap();
        hub.subscribe(&conn, vec!["stations.*".to_string()]).await.unwrap();

        let data = pipeline
            .process_payload("weather_data/5", PAYLOAD.as_bytes())
            .await
            .unwrap();

        assert_eq!(data.id, 5);
        assert!(data.estimate.potential_productivity > 0.0);
        assert!(data.received_at > 0);
        assert_eq!(registry.latest(5).await.unwrap(), data);

        match rx.try_recv().unwrap() {
            ServerMessage::StationData { station } => assert_eq!(station, data),
            other => panic!("Expected StationData, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let (pipeline, registry, _) = pipeline();
        let result = pipeline.process_payload("weather_data", b"{not json").await;
        assert!(matches!(result, Err(IngestError::Decode(_))));
        assert_eq!(registry.station_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_reading_is_not_recorded() {
        let (pipeline, registry, _) = pipeline();
        let mut reading: StationReading = serde_json::from_str(PAYLOAD).unwrap();
        reading.sensors.dht22_humid = Some(140.0);

        let result = pipeline.process(reading, None).await;
        assert!(matches!(result, Err(IngestError::Invalid(_))));
        assert_eq!(registry.station_count().await, 0);
    }

    #[tokio::test]
    async fn test_undated_reading_uses_default_station() {
        let (pipeline, registry, _) = pipeline();
        let mut reading: StationReading = serde_json::from_str(PAYLOAD).unwrap();
        reading.collected_at = None;

        let data = pipeline.process(reading, None).await.unwrap();
        assert_eq!(data.id, 1);
        assert_eq!(registry.station_count().await, 1);
    }
}
