//! WebSocket Push Channel
//!
//! Streams station data to dashboard clients.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! Clients connect to `/api/v1/ws` and subscribe to:
//! - `stations.*` - Every station
//! - `stations.{id}` - One station (e.g., `stations.3`)
//! - `system` - System events
//!
//! Right after a subscription the latest known data of the covered
//! stations is replayed, so a fresh dashboard renders immediately.
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:5000/api/v1/ws');
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['stations.*']}));
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{
    station_topic, ClientMessage, ServerMessage, StationTopic, WsEvent, ALL_STATIONS_TOPIC,
    SYSTEM_TOPIC,
};
