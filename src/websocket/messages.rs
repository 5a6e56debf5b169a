//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! dashboards and the LabMet server, plus the topic naming scheme.

use serde::{Deserialize, Serialize};

use crate::station::{StationData, StationId};

/// Wildcard topic matching every station
pub const ALL_STATIONS_TOPIC: &str = "stations.*";

/// Topic for system events
pub const SYSTEM_TOPIC: &str = "system";

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// Topics to subscribe to (e.g., "stations.3", "stations.*")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// New data from a station
    StationData { station: StationData },
    /// Subscription confirmed
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Server-side notice (broker up/down, shutdown)
    System { message: String },
    /// Error message
    Error { message: String },
    /// Connection established
    Connected { connection_id: String },
}

/// Parsed station topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationTopic {
    All,
    Station(StationId),
}

impl StationTopic {
    /// Parse `stations.*` or `stations.<id>`
    pub fn parse(topic: &str) -> Option<Self> {
        match topic.strip_prefix("stations.")? {
            "*" => Some(StationTopic::All),
            id => id.parse().ok().map(StationTopic::Station),
        }
    }
}

/// Topic of a single station
pub fn station_topic(id: StationId) -> String {
    format!("stations.{}", id)
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "stations.3")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl WsEvent {
    /// Create a station data event from ingested data
    pub fn station_data(data: StationData) -> Self {
        Self {
            topic: station_topic(data.id),
            message: ServerMessage::StationData { station: data },
        }
    }

    /// Create a system event
    pub fn system(message: &str) -> Self {
        Self {
            topic: SYSTEM_TOPIC.to_string(),
            message: ServerMessage::System {
                message: message.to_string(),
            },
        }
    }
}
