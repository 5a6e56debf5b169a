//! Productivity Fixes
//!
//! Dimensionless corrections applied to the raw potential productivity
//! (Doorenbos & Kassam, 1994; Barbieri & Tuon, 1992), plus the conversions
//! used to turn station sensor values into model inputs.

use serde::{Deserialize, Serialize};

/// Illuminance (lux) treated as a fully clear sky
pub const CLEAR_SKY_LUX: f64 = 20_000.0;

/// Upper bound of the leaf area index fix
const MAX_LEAF_AREA_FIX: f64 = 5.0;

/// Breathing (respiration) fix for the mean temperature of the period
pub fn breathing_fix(temperature: f64) -> f64 {
    if temperature >= 20.0 {
        0.6
    } else {
        0.5
    }
}

/// Leaf area index fix for a crop's peak leaf area index
pub fn leaf_area_fix(peak_leaf_area_index: f64) -> f64 {
    let lai = peak_leaf_area_index;
    (0.0093 + 0.185 * lai - 0.0175 * lai.powi(2)).min(MAX_LEAF_AREA_FIX)
}

/// Sunshine ratio n/N estimated from measured illuminance
pub fn lux_to_sunshine_ratio(lux: f64) -> f64 {
    if lux > CLEAR_SKY_LUX {
        1.0
    } else {
        lux.max(0.0) / CLEAR_SKY_LUX
    }
}

/// Soil moisture percentage converted to mm of the available water content
pub fn soil_moisture_to_mm(percentage: f64, awc: f64) -> f64 {
    awc * percentage.clamp(0.0, 100.0) / 100.0
}

/// Temperature fix family by photosynthetic metabolism and season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureFix {
    /// C3 winter crops (potato, wheat, ...)
    C3Winter,
    /// C3 summer crops (soy, rice, ...)
    C3Summer,
    /// C4 crops (corn, sugarcane, sorghum, ...)
    C4,
}

impl TemperatureFix {
    /// Fix for cloudy days at the given mean temperature (°C)
    pub fn cloudy_days(self, t: f64) -> f64 {
        match self {
            TemperatureFix::C3Winter => {
                if (15.0..=20.0).contains(&t) {
                    0.7 + 0.0035 * t - 0.001 * t.powi(2)
                } else {
                    0.25 + 0.0875 * t - 0.0025 * t.powi(2)
                }
            }
            TemperatureFix::C3Summer => {
                if (16.5..=37.0).contains(&t) {
                    0.583 + 0.014 * t + 0.0013 * t.powi(2) - 0.000037 * t.powi(3)
                } else {
                    -0.0425 + 0.035 * t + 0.00325 * t.powi(2) - 0.0000925 * t.powi(3)
                }
            }
            TemperatureFix::C4 => {
                if t >= 16.5 {
                    -1.064 + 0.173 * t - 0.0029 * t.powi(2)
                } else {
                    -4.16 + 0.4325 * t - 0.00725 * t.powi(2)
                }
            }
        }
    }

    /// Fix for clear days at the given mean temperature (°C)
    pub fn clear_days(self, t: f64) -> f64 {
        match self {
            TemperatureFix::C3Winter => {
                if (15.0..=20.0).contains(&t) {
                    0.25 + 0.0875 * t - 0.0025 * t.powi(2)
                } else {
                    -0.5 + 0.175 * t - 0.005 * t.powi(2)
                }
            }
            TemperatureFix::C3Summer => {
                if (16.5..=37.0).contains(&t) {
                    -0.0425 + 0.035 * t + 0.00325 * t.powi(2) - 0.0000925 * t.powi(3)
                } else {
                    -1.085 + 0.07 * t + 0.0065 * t.powi(2) - 0.000185 * t.powi(3)
                }
            }
            TemperatureFix::C4 => {
                if t < 16.5 {
                    -4.16 + 0.4325 * t - 0.00725 * t.powi(2)
                } else {
                    -9.32 + 0.865 * t - 0.0145 * t.powi(2)
                }
            }
        }
    }

    /// Stable name used in config files and tables
    pub fn as_str(self) -> &'static str {
        match self {
            TemperatureFix::C3Winter => "c3_winter",
            TemperatureFix::C3Summer => "c3_summer",
            TemperatureFix::C4 => "c4",
        }
    }
}

impl std::fmt::Display for TemperatureFix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
