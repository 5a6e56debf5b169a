//! MQTT Listener
//!
//! Subscribes to the station topic on the broker and feeds every publish
//! to the ingestion pipeline. Reconnects after broker errors.

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::IngestPipeline;
use crate::config::MqttConfig;

/// Broker connection state, shared with the health endpoint
#[derive(Debug, Clone, Default)]
pub struct MqttStatus(Arc<AtomicBool>);

impl MqttStatus {
    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, connected: bool) -> bool {
        self.0.swap(connected, Ordering::Relaxed)
    }
}

/// Long-running broker subscriber
pub struct MqttListener {
    config: MqttConfig,
    pipeline: Arc<IngestPipeline>,
    status: MqttStatus,
}

impl MqttListener {
    pub fn new(config: MqttConfig, pipeline: Arc<IngestPipeline>) -> Self {
        Self {
            config,
            pipeline,
            status: MqttStatus::default(),
        }
    }

    /// Handle on the connection state
    pub fn status(&self) -> MqttStatus {
        self.status.clone()
    }

    /// Poll the broker until the task is dropped
    pub async fn run(self) {
        let (client, mut eventloop) = AsyncClient::new(mqtt_options(&self.config), 64);
        let qos = qos(self.config.qos);
        let reconnect_delay = Duration::from_secs(self.config.reconnect_delay_secs);

        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            topic = %self.config.topic,
            "Starting MQTT listener"
        );

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    self.status.set(true);
                    tracing::info!(host = %self.config.host, "Connected to MQTT broker");

                    for topic in subscription_topics(&self.config.topic) {
                        if let Err(e) = client.subscribe(topic.as_str(), qos).await {
                            tracing::error!(topic = %topic, error = %e, "MQTT subscribe failed");
                        }
                    }
                    self.pipeline.system_notice("Station broker connected").await;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if let Err(e) = self
                        .pipeline
                        .process_payload(&publish.topic, &publish.payload)
                        .await
                    {
                        tracing::warn!(topic = %publish.topic, error = %e, "Rejected station payload");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    let was_connected = self.status.set(false);
                    tracing::warn!(
                        error = %e,
                        retry_in_secs = reconnect_delay.as_secs(),
                        "MQTT connection error"
                    );
                    if was_connected {
                        self.pipeline
                            .system_notice("Station broker connection lost")
                            .await;
                    }
                    tokio::time::sleep(reconnect_delay).await;
                }
            }
        }
    }
}

/// Client options from the broker configuration
pub(crate) fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    if !config.username.is_empty() {
        options.set_credentials(&config.username, &config.password);
    }
    options
}

/// The base topic plus one level of per-station sub-topics
fn subscription_topics(base: &str) -> [String; 2] {
    let base = base.trim_end_matches('/');
    [base.to_string(), format!("{}/+", base)]
}

pub(crate) fn qos(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}
