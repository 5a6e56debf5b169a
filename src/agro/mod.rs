//! Agronomic models
//!
//! Solar radiation, reference and crop evapotranspiration, crop tables and
//! productivity fixes, the FAO potential/obtainable productivity model and
//! the Thornthwaite-Mather water balance.

pub mod crop;
pub mod error;
pub mod evapotranspiration;
pub mod fixes;
pub mod model;
pub mod productivity;
pub mod radiation;
pub mod water_balance;

pub use crop::{harvest_spec, HarvestSpec, Range, HARVEST_TABLE};
pub use error::{AgroError, AgroResult};
pub use evapotranspiration::{
    effective_temperature, kc_spec, CropCoefficients, DevelopmentStage, KcSpec, Thornthwaite,
    KC_TABLE,
};
pub use fixes::TemperatureFix;
pub use model::{CropModel, CropParameters, ModelInputs, ProductivityEstimate};
pub use productivity::{AreaUnit, PotentialProductivity, YieldResponse};
pub use radiation::{Hemisphere, SolarGeometry};
pub use water_balance::{WaterBalance, WaterBalancePeriod, WaterBalanceStep};

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
