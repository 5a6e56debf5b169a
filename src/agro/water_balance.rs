//! Thornthwaite-Mather Water Balance
//!
//! Sequential soil water accounting: every period takes the precipitation
//! and the potential evapotranspiration and updates the soil storage,
//! the accumulated negative (P - PET), and the real evapotranspiration,
//! deficit and excess of the period.

use serde::{Deserialize, Serialize};

use super::error::{ensure_finite, AgroError, AgroResult};

/// Inputs of one period (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterBalancePeriod {
    pub precipitation: f64,
    pub pet: f64,
}

/// State of the balance after one period (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterBalanceStep {
    pub precipitation: f64,
    pub pet: f64,
    /// P - PET
    pub precipitation_pet: f64,
    pub accumulated_negative: f64,
    pub soil_water_moisture: f64,
    pub variation: f64,
    pub real_et: f64,
    pub deficit: f64,
    pub excess: f64,
}

/// Running water balance for a soil with a given available water content
#[derive(Debug, Clone)]
pub struct WaterBalance {
    awc: f64,
    storage: f64,
    accumulated_negative: Option<f64>,
    variation: Option<f64>,
}

impl WaterBalance {
    /// Start a balance for `awc` mm of available water, holding
    /// `initial_storage` mm
    pub fn new(awc: f64, initial_storage: f64) -> AgroResult<Self> {
        let awc = ensure_finite("awc", awc)?;
        if awc <= 0.0 {
            return Err(AgroError::OutOfRange {
                name: "awc",
                value: awc,
                expected: "> 0",
            });
        }
        let storage = ensure_finite("initial_storage", initial_storage)?;
        if !(0.0..=awc).contains(&storage) {
            return Err(AgroError::OutOfRange {
                name: "initial_storage",
                value: storage,
                expected: "0..=awc",
            });
        }

        Ok(Self {
            awc,
            storage,
            accumulated_negative: None,
            variation: None,
        })
    }

    pub fn awc(&self) -> f64 {
        self.awc
    }

    /// Current soil water storage (mm)
    pub fn storage(&self) -> f64 {
        self.storage
    }

    /// Advance the balance by one period
    pub fn step(&mut self, precipitation: f64, pet: f64) -> AgroResult<WaterBalanceStep> {
        let precipitation = ensure_finite("precipitation", precipitation)?;
        let pet = ensure_finite("pet", pet)?;
        if precipitation < 0.0 || pet < 0.0 {
            return Err(AgroError::InvalidInput(
                "precipitation and pet must not be negative".to_string(),
            ));
        }

        let diff = precipitation - pet;
        let surplus = diff >= 0.0;
        let previous = self.storage;

        let recharged = (previous + diff).min(self.awc);
        let accumulated = match self.accumulated_negative {
            None if surplus => 0.0,
            None => diff,
            Some(acc) if surplus => {
                if recharged > 0.0 {
                    self.awc * (recharged / self.awc).ln()
                } else {
                    acc
                }
            }
            Some(acc) => -acc.abs() + diff,
        };

        let storage = if surplus {
            recharged
        } else {
            self.awc * (-(accumulated / self.awc).abs()).exp()
        };

        let variation = match self.variation {
            None if surplus => 0.0,
            None => storage - self.awc,
            Some(_) => storage - previous,
        };

        let real_et = if surplus {
            pet
        } else {
            precipitation + variation.abs()
        };
        let deficit = if surplus { 0.0 } else { pet - real_et };
        let excess = if storage < self.awc {
            0.0
        } else {
            diff - variation
        };

        self.storage = storage;
        self.accumulated_negative = Some(accumulated);
        self.variation = Some(variation);

        Ok(WaterBalanceStep {
            precipitation,
            pet,
            precipitation_pet: diff,
            accumulated_negative: accumulated,
            soil_water_moisture: storage,
            variation,
            real_et,
            deficit,
            excess,
        })
    }

    /// Run a whole sequence of periods
    pub fn run(
        awc: f64,
        initial_storage: f64,
        periods: &[WaterBalancePeriod],
    ) -> AgroResult<Vec<WaterBalanceStep>> {
        let mut balance = Self::new(awc, initial_storage)?;
        periods
            .iter()
            .map(|p| balance.step(p.precipitation, p.pet))
            .collect()
    }
}
