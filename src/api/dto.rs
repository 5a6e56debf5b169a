//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::agro::{
    CropCoefficients, CropParameters, HarvestSpec, KcSpec, ProductivityEstimate,
    WaterBalancePeriod, WaterBalanceStep,
};
use crate::station::{StationData, StationId, StationReading};

// ============================================
// INGEST DTOs
// ============================================

/// Batch ingest request
#[derive(Debug, Deserialize)]
pub struct BatchIngestRequest {
    /// Readings, processed in order
    pub readings: Vec<StationReading>,
}

/// Batch ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchIngestResponse {
    /// Status: "ok" or "partial"
    pub status: String,
    /// Number of readings accepted
    pub accepted: usize,
    /// Number of readings rejected
    pub rejected: usize,
    /// Errors for rejected readings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchError>,
}

/// Error for a single reading in batch ingest
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchError {
    /// Index in the request array
    pub index: usize,
    /// Error message
    pub error: String,
}

// ============================================
// STATION DTOs
// ============================================

/// Latest data of every station
#[derive(Debug, Serialize, Deserialize)]
pub struct StationsResponse {
    pub stations: Vec<StationData>,
    pub count: usize,
}

/// History query parameters
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Most recent N readings
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Recent readings of one station, oldest first
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub id: StationId,
    pub readings: Vec<StationData>,
}

// ============================================
// CULTURE DTOs
// ============================================

/// Reference tables
#[derive(Debug, Serialize)]
pub struct CulturesResponse {
    pub harvest: Vec<HarvestSpec>,
    pub crop_coefficients: Vec<KcSpec>,
}

/// Weather used to pick crop coefficients
#[derive(Debug, Default, Deserialize)]
pub struct CultureQuery {
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
}

/// Everything known about one culture
#[derive(Debug, Serialize)]
pub struct CultureResponse {
    pub culture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harvest: Option<HarvestSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_coefficients: Option<KcSpec>,
    /// Coefficients picked for the given weather
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<CropCoefficients>,
}

// ============================================
// MODEL DTOs
// ============================================

/// Ad-hoc productivity estimate request
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    /// Soil moisture (%)
    pub soil_moisture: f64,
    /// Air temperature (°C)
    pub temperature: f64,
    /// Illuminance (lux)
    pub illuminance: f64,
    /// Reading time in station format or RFC 3339, defaults to now
    #[serde(default)]
    pub collected_at: Option<String>,
    /// Crop parameters, defaults to the server's crop
    #[serde(default)]
    pub crop: Option<CropParameters>,
}

/// Productivity estimate response
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub culture: String,
    pub unit: String,
    pub date: NaiveDateTime,
    #[serde(flatten)]
    pub estimate: ProductivityEstimate,
}

// ============================================
// WATER BALANCE DTOs
// ============================================

/// Sequential water balance request
#[derive(Debug, Deserialize)]
pub struct WaterBalanceRequest {
    /// Available water content (mm), defaults to the crop's
    #[serde(default)]
    pub awc: Option<f64>,
    /// Soil water at the start (mm)
    #[serde(default)]
    pub initial_storage: f64,
    pub periods: Vec<WaterBalancePeriod>,
}

/// Water balance table
#[derive(Debug, Serialize, Deserialize)]
pub struct WaterBalanceResponse {
    pub awc: f64,
    pub steps: Vec<WaterBalanceStep>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: String,
    /// Broker status: "connected", "disconnected" or "disabled"
    pub mqtt: String,
    /// Stations that reported at least once
    pub stations: usize,
    /// Open dashboard connections
    pub connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
