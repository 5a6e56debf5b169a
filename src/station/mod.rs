//! Weather stations
//!
//! - **Reading**: payload published by a station and the enriched data
//!   pushed to dashboards
//! - **Registry**: latest data and bounded history per station

mod reading;
mod registry;

pub use reading::{
    parse_collected_at, ReadingError, SensorValues, StationData, StationId, StationReading,
    COLLECTED_AT_FORMAT,
};
pub use registry::{StationRegistry, DEFAULT_HISTORY_CAPACITY};
