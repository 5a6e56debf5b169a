//! Station payloads
//!
//! `StationReading` is what a station publishes; `StationData` is the
//! reading after ingestion, with the resolved station id and the crop
//! model figures. Both serialize flat.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agro::{ModelInputs, ProductivityEstimate};

/// Timestamp format used by the station firmware
pub const COLLECTED_AT_FORMAT: &str = "%m/%d/%YT%H:%M:%S";

/// Station identifier
pub type StationId = u32;

/// Errors raised while checking a reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadingError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid collected_at '{0}'")]
    InvalidTimestamp(String),
}

/// Sensor values of one reading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmp180_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmp180_alt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmp180_press: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dht22_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dht22_humid: Option<f64>,
    /// Air temperature (°C), drives the crop model
    pub ds18b20_temp: f64,
    /// Illuminance (lux)
    pub bh1750_illuminance: f64,
    /// Soil moisture (% of the available water capacity)
    pub analog_soil_moisture: f64,
}

impl SensorValues {
    /// Check every value is usable
    pub fn validate(&self) -> Result<(), ReadingError> {
        finite("ds18b20_temp", self.ds18b20_temp)?;
        finite("bh1750_illuminance", self.bh1750_illuminance)?;
        finite("analog_soil_moisture", self.analog_soil_moisture)?;

        let optional = [
            ("bmp180_temp", self.bmp180_temp),
            ("bmp180_alt", self.bmp180_alt),
            ("bmp180_press", self.bmp180_press),
            ("dht22_temp", self.dht22_temp),
            ("dht22_humid", self.dht22_humid),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                finite(field, v)?;
            }
        }

        if let Some(humidity) = self.dht22_humid {
            if !(0.0..=100.0).contains(&humidity) {
                return Err(ReadingError::InvalidValue {
                    field: "dht22_humid",
                    reason: format!("{} is outside 0..=100", humidity),
                });
            }
        }
        if self.bh1750_illuminance < 0.0 {
            return Err(ReadingError::InvalidValue {
                field: "bh1750_illuminance",
                reason: "must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ReadingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ReadingError::InvalidValue {
            field,
            reason: "must be a finite number".to_string(),
        })
    }
}

/// Payload published by a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,

    #[serde(flatten)]
    pub sensors: SensorValues,
}

impl StationReading {
    pub fn validate(&self) -> Result<(), ReadingError> {
        self.sensors.validate()?;
        self.collected_at_time()?;
        Ok(())
    }

    /// Parsed collection time, in the station format or RFC 3339
    pub fn collected_at_time(&self) -> Result<Option<NaiveDateTime>, ReadingError> {
        match self.collected_at.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_collected_at(text).map(Some),
        }
    }

    /// Crop model inputs for this reading, dated `fallback` when the
    /// station sent no time
    pub fn model_inputs(&self, fallback: NaiveDateTime) -> Result<ModelInputs, ReadingError> {
        Ok(ModelInputs {
            soil_moisture: self.sensors.analog_soil_moisture,
            temperature: self.sensors.ds18b20_temp,
            illuminance: self.sensors.bh1750_illuminance,
            date: self.collected_at_time()?.unwrap_or(fallback),
        })
    }
}

/// Parse a station timestamp
pub fn parse_collected_at(text: &str) -> Result<NaiveDateTime, ReadingError> {
    NaiveDateTime::parse_from_str(text, COLLECTED_AT_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.naive_local()))
        .map_err(|_| ReadingError::InvalidTimestamp(text.to_string()))
}

/// Ingested station data pushed to dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationData {
    pub id: StationId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collected_at: Option<String>,

    /// Server receive time in milliseconds
    pub received_at: i64,

    #[serde(flatten)]
    pub sensors: SensorValues,

    #[serde(flatten)]
    pub estimate: ProductivityEstimate,
}

impl StationData {
    pub fn new(
        id: StationId,
        reading: StationReading,
        estimate: ProductivityEstimate,
        received_at: i64,
    ) -> Self {
        Self {
            id,
            collected_at: reading.collected_at,
            received_at,
            sensors: reading.sensors,
            estimate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SIMULATED: &str = r#"{
        "collected_at": "06/15/2016T13:45:10",
        "bmp180_temp": 21.5,
        "bmp180_alt": 640.2,
        "bmp180_press": 1.71,
        "ds18b20_temp": 22.0,
        "dht22_temp": 21.8,
        "dht22_humid": 64.0,
        "bh1750_illuminance": 512,
        "analog_soil_moisture": 30.5
    }"#;

    #[test]
    fn test_deserialize_simulated_payload() {
        let reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        assert_eq!(reading.id, None);
        assert_eq!(reading.sensors.bh1750_illuminance, 512.0);
        assert_eq!(reading.sensors.dht22_humid, Some(64.0));
        assert!(reading.validate().is_ok());
    }

    #[test]
    fn test_minimal_payload() {
        let reading: StationReading = serde_json::from_str(
            r#"{"id": 3, "ds18b20_temp": 20, "bh1750_illuminance": 0, "analog_soil_moisture": 12}"#,
        )
        .unwrap();
        assert_eq!(reading.id, Some(3));
        assert_eq!(reading.sensors.bmp180_press, None);
        assert!(reading.validate().is_ok());
    }

    #[test]
    fn test_missing_required_value() {
        let result: Result<StationReading, _> =
            serde_json::from_str(r#"{"ds18b20_temp": 20, "bh1750_illuminance": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        reading.sensors.dht22_humid = Some(120.0);
        assert!(matches!(
            reading.validate(),
            Err(ReadingError::InvalidValue { field: "dht22_humid", .. })
        ));

        let mut reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        reading.sensors.bh1750_illuminance = -1.0;
        assert!(reading.validate().is_err());

        let mut reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        reading.sensors.ds18b20_temp = f64::NAN;
        assert!(reading.validate().is_err());

        let mut reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        reading.collected_at = Some("yesterday".to_string());
        assert!(matches!(
            reading.validate(),
            Err(ReadingError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_collected_at_formats() {
        let station = parse_collected_at("06/15/2016T13:45:10").unwrap();
        assert_eq!(station.month(), 6);
        assert_eq!(station.day(), 15);
        assert_eq!(station.hour(), 13);

        let rfc = parse_collected_at("2016-06-15T13:45:10-03:00").unwrap();
        assert_eq!(rfc, station);
    }

    #[test]
    fn test_model_inputs_fallback_date() {
        let fallback = parse_collected_at("01/01/2017T00:00:00").unwrap();

        let reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        let inputs = reading.model_inputs(fallback).unwrap();
        assert_eq!(inputs.date.year(), 2016);
        assert_eq!(inputs.soil_moisture, 30.5);
        assert_eq!(inputs.temperature, 22.0);

        let mut undated = reading.clone();
        undated.collected_at = None;
        assert_eq!(undated.model_inputs(fallback).unwrap().date, fallback);
    }

    #[test]
    fn test_station_data_serializes_flat() {
        let reading: StationReading = serde_json::from_str(SIMULATED).unwrap();
        let estimate = ProductivityEstimate {
            potential_productivity: 5400.0,
            obtainable_productivity: 4100.0,
            etc: 2.1,
            eto: 3.4,
        };
        let data = StationData::new(7, reading, estimate, 1_466_000_000_000);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["ds18b20_temp"], 22.0);
        assert_eq!(json["obtainable_productivity"], 4100.0);
        assert_eq!(json["eto"], 3.4);
        assert!(json.get("sensors").is_none());
        assert!(json.get("estimate").is_none());

        let back: StationData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
