//! Crop Tables
//!
//! Harvested part fix and harvest humidity by culture, from the FAO model
//! description (Doorenbos & Kassam, 1994).

use serde::Serialize;

use super::error::{AgroError, AgroResult};

/// A tabulated `[min, max]` interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub(crate) const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Mean of the interval limits
    pub fn average(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Harvested part of a culture and its fixes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HarvestSpec {
    /// Culture name
    pub culture: &'static str,
    /// Harvested part (tuber, grain, fruit, ...)
    pub harvested_part: &'static str,
    /// Harvested part fix limits
    pub harvest_fix: Range,
    /// Humidity of the harvested part (%)
    pub humidity: Range,
}

impl HarvestSpec {
    /// Average harvested part fix used by the productivity model
    pub fn harvest_fix_average(&self) -> f64 {
        self.harvest_fix.average()
    }
}

const fn harvest(
    culture: &'static str,
    harvested_part: &'static str,
    fix: (f64, f64),
    humidity: (f64, f64),
) -> HarvestSpec {
    HarvestSpec {
        culture,
        harvested_part,
        harvest_fix: Range::new(fix.0, fix.1),
        humidity: Range::new(humidity.0, humidity.1),
    }
}

/// Harvested part fix table, sorted by culture name
pub const HARVEST_TABLE: &[HarvestSpec] = &[
    harvest("alfalfa1", "hay", (0.40, 0.50), (10.0, 15.0)),
    harvest("alfalfa2", "hay", (0.80, 0.90), (10.0, 15.0)),
    harvest("banana_subtropical", "fruit", (1.0, 1.0), (70.0, 80.0)),
    harvest("banana_tropical", "fruit", (1.0, 1.0), (70.0, 80.0)),
    harvest("bean", "grain", (1.0, 1.0), (70.0, 80.0)),
    harvest("beet", "sugar", (0.35, 0.45), (80.0, 85.0)),
    harvest("cabbage", "head", (0.60, 0.70), (90.0, 90.0)),
    harvest("citrus", "fruit", (1.0, 1.0), (70.0, 85.0)),
    harvest("corn", "grain", (0.35, 0.45), (10.0, 13.0)),
    harvest("cotton", "fiber", (0.08, 0.12), (0.0, 0.0)),
    harvest("grape", "fruit", (1.0, 1.0), (20.0, 20.0)),
    harvest("olive", "fruit", (1.0, 1.0), (30.0, 30.0)),
    harvest("onion", "bulb", (0.20, 0.30), (85.0, 90.0)),
    harvest("pea_grain", "grain", (0.30, 0.40), (10.0, 10.0)),
    harvest("pea_legume", "legume", (0.30, 0.40), (10.0, 10.0)),
    harvest("peanut", "grain", (0.25, 0.35), (15.0, 15.0)),
    harvest("pepper", "fruit", (0.20, 0.40), (90.0, 90.0)),
    harvest("pineapple", "fruit", (0.50, 0.60), (80.0, 85.0)),
    harvest("potato", "tuber", (0.55, 0.65), (70.0, 75.0)),
    harvest("rice", "grain", (0.40, 0.50), (15.0, 20.0)),
    harvest("sorghum", "grain", (0.30, 0.40), (12.0, 15.0)),
    harvest("soy", "grain", (0.30, 0.40), (6.0, 10.0)),
    harvest("sugarcane", "sugar", (0.70, 0.80), (80.0, 80.0)),
    harvest("sunflower", "seed", (0.20, 0.30), (10.0, 15.0)),
    harvest("tomato", "fruit", (0.25, 0.35), (80.0, 90.0)),
    harvest("watermelon", "fruit", (1.0, 1.0), (90.0, 90.0)),
    harvest("wheat", "grain", (0.35, 0.45), (12.0, 15.0)),
];

/// Look up the harvest fixes of a culture
pub fn harvest_spec(culture: &str) -> AgroResult<&'static HarvestSpec> {
    let name = culture.trim().to_lowercase();
    HARVEST_TABLE
        .iter()
        .find(|spec| spec.culture == name)
        .ok_or_else(|| AgroError::UnknownCulture(culture.to_string()))
}
