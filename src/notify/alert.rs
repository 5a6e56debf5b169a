//! Dry soil alert
//!
//! Notifies mobile devices when a station reports very dry soil, at most
//! once per cooldown for each station.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{Notifier, NotifyError};
use crate::config::AlertsConfig;
use crate::station::{StationData, StationId};

/// Dry soil alert policy
pub struct DryAlert {
    notifier: Arc<dyn Notifier>,
    threshold: f64,
    cooldown: Duration,
    last_sent: Mutex<HashMap<StationId, Instant>>,
}

impl DryAlert {
    pub fn new(notifier: Arc<dyn Notifier>, config: &AlertsConfig) -> Self {
        Self {
            notifier,
            threshold: config.dry_soil_threshold,
            cooldown: Duration::from_secs(config.cooldown_secs),
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Check new station data, notifying when the soil is too dry
    ///
    /// Returns whether a notification went out.
    pub async fn check(&self, data: &StationData) -> Result<bool, NotifyError> {
        self.check_at(data, Instant::now()).await
    }

    async fn check_at(&self, data: &StationData, now: Instant) -> Result<bool, NotifyError> {
        let moisture = data.sensors.analog_soil_moisture;
        if moisture >= self.threshold {
            return Ok(false);
        }

        if let Some(at) = self.last_sent.lock().await.get(&data.id) {
            if now.duration_since(*at) < self.cooldown {
                tracing::trace!(station_id = data.id, "Dry soil alert in cooldown");
                return Ok(false);
            }
        }

        let message = dry_soil_message(data.id, moisture);
        tracing::warn!(station_id = data.id, moisture, "Soil is very dry");
        self.notifier.send_all(&message).await?;

        // Cooldown starts only once a notification went out
        self.last_sent.lock().await.insert(data.id, now);
        Ok(true)
    }
}

/// Alert text for a station
pub fn dry_soil_message(id: StationId, moisture: f64) -> String {
    format!("Station #{}: soil is very dry ({:.2}%)", id, moisture)
}
