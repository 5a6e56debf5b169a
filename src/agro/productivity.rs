//! Crop Productivity
//!
//! Potential productivity after Doorenbos & Kassam (1994), and the
//! obtainable productivity under water deficit with the yield response
//! factor (ky).

use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, AgroError, AgroResult};

/// Unit of a productivity figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    /// kg/ha
    #[default]
    KgPerHectare,
    /// kg/m²
    KgPerSquareMeter,
}

impl AreaUnit {
    fn convert(self, kg_per_hectare: f64) -> f64 {
        match self {
            AreaUnit::KgPerHectare => kg_per_hectare,
            AreaUnit::KgPerSquareMeter => kg_per_hectare / 10_000.0,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AreaUnit::KgPerHectare => "kg/ha",
            AreaUnit::KgPerSquareMeter => "kg/m²",
        }
    }
}

/// Raw and potential productivity of a crop for a period
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotentialProductivity {
    ho: f64,
    cloudy_fix: f64,
    clear_fix: f64,
    sunshine_ratio: f64,
}

impl PotentialProductivity {
    /// Create from the extraterrestrial irradiance Ho (MJ m⁻² day⁻¹), the
    /// temperature fixes for cloudy and clear days and the sunshine ratio n/N
    pub fn new(ho: f64, cloudy_fix: f64, clear_fix: f64, sunshine_ratio: f64) -> AgroResult<Self> {
        let sunshine_ratio = ensure_finite("sunshine_ratio", sunshine_ratio)?;
        if !(0.0..=1.0).contains(&sunshine_ratio) {
            return Err(AgroError::OutOfRange {
                name: "sunshine_ratio",
                value: sunshine_ratio,
                expected: "0..=1",
            });
        }

        Ok(Self {
            ho: ensure_finite("ho", ho)?,
            cloudy_fix: ensure_finite("cloudy_fix", cloudy_fix)?,
            clear_fix: ensure_finite("clear_fix", clear_fix)?,
            sunshine_ratio,
        })
    }

    /// Create from the sunshine hours n and the photoperiod N
    pub fn from_hours(
        ho: f64,
        cloudy_fix: f64,
        clear_fix: f64,
        sunshine_hours: f64,
        photoperiod: f64,
    ) -> AgroResult<Self> {
        if !(photoperiod > 0.0) {
            return Err(AgroError::InvalidInput(
                "photoperiod must be greater than zero".to_string(),
            ));
        }
        Self::new(ho, cloudy_fix, clear_fix, sunshine_hours / photoperiod)
    }

    pub fn sunshine_ratio(&self) -> f64 {
        self.sunshine_ratio
    }

    /// Raw productivity of the cloudy fraction of a day
    pub fn raw_cloudy_days(&self, unit: AreaUnit) -> f64 {
        let kg_ha = (31.7 + 0.219 * self.ho) * self.cloudy_fix * (1.0 - self.sunshine_ratio);
        unit.convert(kg_ha)
    }

    /// Raw productivity of the clear fraction of a day
    pub fn raw_clear_days(&self, unit: AreaUnit) -> f64 {
        let kg_ha = (107.2 + 0.36 * self.ho) * self.clear_fix * self.sunshine_ratio;
        unit.convert(kg_ha)
    }

    /// Raw productivity over a crop cycle
    pub fn raw(&self, cycle_days: u32, unit: AreaUnit) -> f64 {
        (self.raw_cloudy_days(unit) + self.raw_clear_days(unit)) * cycle_days as f64
    }

    /// Potential productivity over a crop cycle, never negative
    pub fn potential(
        &self,
        leaf_area_fix: f64,
        breathing_fix: f64,
        harvest_fix: f64,
        cycle_days: u32,
        unit: AreaUnit,
    ) -> f64 {
        let value = self.raw(cycle_days, unit) * leaf_area_fix * breathing_fix * harvest_fix;
        if value.is_finite() {
            value.max(0.0)
        } else {
            0.0
        }
    }
}

/// Yield response to water deficit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldResponse {
    /// Yield response factor
    pub ky: f64,
}

impl YieldResponse {
    pub fn new(ky: f64) -> AgroResult<Self> {
        let ky = ensure_finite("ky", ky)?;
        if ky < 0.0 {
            return Err(AgroError::OutOfRange {
                name: "ky",
                value: ky,
                expected: ">= 0",
            });
        }
        Ok(Self { ky })
    }

    /// Obtainable productivity given real and maximum crop
    /// evapotranspiration
    ///
    /// Without crop water demand the whole potential is obtainable. The
    /// result is clamped at zero under severe deficit.
    pub fn obtainable(&self, real_et: f64, max_et: f64, potential: f64) -> f64 {
        if !(max_et > 0.0) {
            return potential.max(0.0);
        }
        let relative = (real_et / max_et).clamp(0.0, 1.0);
        ((1.0 - self.ky * (1.0 - relative)) * potential).max(0.0)
    }
}
