//! # LabMet
//!
//! Weather station monitoring: stations publish sensor readings over MQTT,
//! the server runs an agronomic crop model on every reading and pushes the
//! enriched data to live dashboards over WebSocket.
//!
//! ## Modules
//!
//! - [`agro`]: radiation, evapotranspiration, crop tables, productivity,
//!   water balance and the crop model
//! - [`station`]: station payloads and the in-memory registry
//! - [`ingest`]: ingestion pipeline and MQTT listener
//! - [`notify`]: push notifications and the dry soil alert
//! - [`websocket`]: push channel for dashboards
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labmet::agro::{CropModel, CropParameters, ModelInputs};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = CropModel::new(CropParameters::default())?;
//!
//!     let estimate = model.estimate(&ModelInputs {
//!         soil_moisture: 25.0,
//!         temperature: 18.0,
//!         illuminance: 800.0,
//!         date: chrono::Local::now().naive_local(),
//!     })?;
//!
//!     println!(
//!         "potential {:.2} kg/ha, obtainable {:.2} kg/ha",
//!         estimate.potential_productivity, estimate.obtainable_productivity
//!     );
//!     Ok(())
//! }
//! ```

pub mod agro;
pub mod api;
pub mod config;
pub mod ingest;
pub mod notify;
pub mod station;
pub mod websocket;

// Re-export top-level types for convenience
pub use agro::{
    AgroError, AgroResult, AreaUnit, CropModel, CropParameters, ModelInputs,
    ProductivityEstimate, WaterBalance, WaterBalancePeriod, WaterBalanceStep,
};

pub use station::{StationData, StationId, StationReading, StationRegistry};

pub use ingest::{IngestError, IngestPipeline, MqttListener, MqttStatus};

pub use notify::{DryAlert, Notifier, NotifyError, PushNotifier};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage,
    WsEvent,
};

pub use config::{Config, ConfigError, LoggingConfig};
