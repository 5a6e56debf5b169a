//! State Management
//!
//! Station view models, global signals and the WebSocket connection.

pub mod global;
pub mod station;
pub mod websocket;

pub use global::{provide_global_state, GlobalState};
pub use station::{StationBoard, StationView};
