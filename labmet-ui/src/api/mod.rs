//! REST API access

pub mod client;

pub use client::{check_health, get_api_base, HealthResponse};
