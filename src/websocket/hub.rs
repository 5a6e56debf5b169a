//! WebSocket Connection Hub
//!
//! Manages dashboard connections, their topic subscriptions and the fan-out
//! of station events.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, StationTopic, WsEvent, SYSTEM_TOPIC};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Topic subscriptions: Topic → Set of ConnectionIds
    subscriptions: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    pub subscriptions: HashSet<String>,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Fails once the connection limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics, returning the accepted ones
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone()).or_default().insert(id.to_string());
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic
    ///
    /// `stations.*` subscribers receive every `stations.<id>` event.
    /// Returns the number of connections reached.
    pub async fn publish(&self, event: WsEvent) -> usize {
        // Release `subscriptions` before locking `connections`; subscribe
        // holds them in the opposite order.
        let targets: HashSet<ConnectionId> = {
            let subs = self.subscriptions.read().await;
            let mut targets = HashSet::new();
            if let Some(ids) = subs.get(&event.topic) {
                targets.extend(ids.iter().cloned());
            }
            if let Some((prefix, _)) = event.topic.split_once('.') {
                if let Some(ids) = subs.get(&format!("{}.*", prefix)) {
                    targets.extend(ids.iter().cloned());
                }
            }
            targets
        };

        let connections = self.connections.read().await;
        let mut sent = 0;
        for id in targets {
            if let Some(handle) = connections.get(&id) {
                if handle.sender.send(event.message.clone()).is_ok() {
                    sent += 1;
                }
            }
        }

        if sent > 0 {
            tracing::trace!(topic = %event.topic, subscribers = sent, "Published event");
        }
        sent
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get subscription count for a topic
    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

/// Valid topics: `stations.*`, `stations.<id>` and `system`
fn is_valid_topic(topic: &str) -> bool {
    topic == SYSTEM_TOPIC || StationTopic::parse(topic).is_some()
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agro::ProductivityEstimate;
    use crate::station::{SensorValues, StationData};

    fn event(id: u32) -> WsEvent {
        WsEvent::station_data(StationData {
            id,
            collected_at: None,
            received_at: 0,
            sensors: SensorValues::default(),
            estimate: ProductivityEstimate::default(),
        })
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("stations.*"));
        assert!(is_valid_topic("stations.7"));
        assert!(is_valid_topic("system"));

        assert!(!is_valid_topic("stations.seven"));
        assert!(!is_valid_topic("metrics.*"));
        assert!(!is_valid_topic(""));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["stations.1".to_string(), "bogus".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["stations.1"]);
        assert_eq!(hub.subscription_count("stations.1").await, 1);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["stations.1".to_string()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["stations.1"]);
        assert_eq!(hub.subscription_count("stations.1").await, 0);

        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let hub = ConnectionHub::new(HubConfig::default());
        let result = hub.subscribe("missing", vec!["system".to_string()]).await;
        assert!(matches!(result, Err(HubError::ConnectionNotFound)));
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 2 });

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        hub.register(tx1).await.unwrap();
        hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));
    }

    #[tokio::test]
    async fn test_publish_to_station_subscribers() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        hub.subscribe(&id1, vec!["stations.1".to_string()]).await.unwrap();
        hub.subscribe(&id2, vec!["stations.2".to_string()]).await.unwrap();

        assert_eq!(hub.publish(event(1)).await, 1);

        assert!(matches!(
            rx1.try_recv(),
            Ok(ServerMessage::StationData { .. })
        ));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_subscription() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        hub.subscribe(&id, vec!["stations.*".to_string(), "stations.5".to_string()])
            .await
            .unwrap();

        // One delivery even when both the wildcard and the station match
        assert_eq!(hub.publish(event(5)).await, 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        assert_eq!(hub.publish(event(8)).await, 1);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_system_events() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        assert_eq!(hub.publish(WsEvent::system("broker offline")).await, 0);

        hub.subscribe(&id, vec!["system".to_string()]).await.unwrap();
        assert_eq!(hub.publish(WsEvent::system("broker offline")).await, 1);
        assert!(matches!(rx.try_recv(), Ok(ServerMessage::System { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_publish_concurrent_with_subscribe() {
        let hub = std::sync::Arc::new(ConnectionHub::new(HubConfig::default()));
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let (tx, rx) = mpsc::unbounded_channel();
            ids.push(hub.register(tx).await.unwrap());
            receivers.push(rx);
        }

        let mut tasks = Vec::new();
        for id in ids {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..2_000 {
                    hub.subscribe(&id, vec!["stations.1".to_string()]).await.unwrap();
                    hub.unsubscribe(&id, vec!["stations.1".to_string()]).await.unwrap();
                }
            }));
        }
        for _ in 0..4 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..2_000 {
                    hub.publish(event(1)).await;
                }
            }));
        }

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(30), all)
            .await
            .expect("hub locks deadlocked");
        drop(receivers);
    }
}
