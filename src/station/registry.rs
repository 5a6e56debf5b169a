//! In-memory station registry
//!
//! Keeps the latest data of every station plus a bounded history used by
//! the REST API and to replay state to freshly connected dashboards.

use std::collections::{BTreeMap, VecDeque};
use tokio::sync::RwLock;

use super::reading::{StationData, StationId};

/// Default number of readings kept per station
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

struct StationEntry {
    latest: StationData,
    history: VecDeque<StationData>,
}

/// Latest data and recent history per station
pub struct StationRegistry {
    stations: RwLock<BTreeMap<StationId, StationEntry>>,
    history_capacity: usize,
}

impl StationRegistry {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            stations: RwLock::new(BTreeMap::new()),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Record new station data, dropping the oldest history entry when full
    pub async fn record(&self, data: StationData) {
        let mut stations = self.stations.write().await;
        let capacity = self.history_capacity;

        let entry = stations.entry(data.id).or_insert_with(|| StationEntry {
            latest: data.clone(),
            history: VecDeque::with_capacity(capacity),
        });
        if entry.history.len() == capacity {
            entry.history.pop_front();
        }
        entry.history.push_back(data.clone());
        entry.latest = data;
    }

    /// Latest data of a station
    pub async fn latest(&self, id: StationId) -> Option<StationData> {
        self.stations.read().await.get(&id).map(|e| e.latest.clone())
    }

    /// Latest data of every station, ordered by id
    pub async fn list(&self) -> Vec<StationData> {
        self.stations
            .read()
            .await
            .values()
            .map(|e| e.latest.clone())
            .collect()
    }

    /// Recorded history of a station, oldest first
    ///
    /// `limit` keeps only the most recent entries.
    pub async fn history(&self, id: StationId, limit: Option<usize>) -> Option<Vec<StationData>> {
        let stations = self.stations.read().await;
        let entry = stations.get(&id)?;
        let skip = limit
            .map(|l| entry.history.len().saturating_sub(l))
            .unwrap_or(0);
        Some(entry.history.iter().skip(skip).cloned().collect())
    }

    pub async fn station_count(&self) -> usize {
        self.stations.read().await.len()
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agro::ProductivityEstimate;
    use crate::station::reading::SensorValues;

    fn data(id: StationId, received_at: i64) -> StationData {
        StationData {
            id,
            collected_at: None,
            received_at,
            sensors: SensorValues {
                ds18b20_temp: 20.0,
                bh1750_illuminance: 100.0,
                analog_soil_moisture: 25.0,
                ..SensorValues::default()
            },
            estimate: ProductivityEstimate::default(),
        }
    }

    #[tokio::test]
    async fn test_record_and_latest() {
        let registry = StationRegistry::default();
        assert!(registry.latest(1).await.is_none());

        registry.record(data(1, 10)).await;
        registry.record(data(1, 20)).await;

        assert_eq!(registry.latest(1).await.unwrap().received_at, 20);
        assert_eq!(registry.station_count().await, 1);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let registry = StationRegistry::default();
        registry.record(data(9, 1)).await;
        registry.record(data(2, 2)).await;
        registry.record(data(5, 3)).await;

        let ids: Vec<_> = registry.list().await.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let registry = StationRegistry::new(3);
        for t in 0..5 {
            registry.record(data(1, t)).await;
        }

        let history = registry.history(1, None).await.unwrap();
        let times: Vec<_> = history.iter().map(|d| d.received_at).collect();
        assert_eq!(times, vec![2, 3, 4]);

        let recent = registry.history(1, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].received_at, 3);

        assert!(registry.history(42, None).await.is_none());
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        assert_eq!(StationRegistry::new(0).history_capacity(), 1);
    }
}
