//! Evapotranspiration
//!
//! Reference evapotranspiration by the Thornthwaite method (and the
//! Camargo effective temperature variant) plus the crop coefficient
//! table used to turn it into crop evapotranspiration.

use serde::Serialize;

use super::crop::Range;
use super::error::{ensure_finite, AgroError, AgroResult};
use super::round2;

/// Upper mean temperature (°C) of the exponential ETp formula
const MAX_STANDARD_TEMPERATURE: f64 = 26.5;

/// Thornthwaite reference evapotranspiration for one month
///
/// The standard ETp is the evapotranspiration of a 30 day month with a
/// 12 hour photoperiod, corrected for the actual photoperiod and month
/// length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thornthwaite {
    temperature: f64,
    photoperiod: f64,
    days: u32,
    annual_temperature: f64,
}

impl Thornthwaite {
    /// Create the method for a mean temperature (°C), photoperiod (hours),
    /// month length (days) and mean annual temperature (°C)
    pub fn new(
        temperature: f64,
        photoperiod: f64,
        days: u32,
        annual_temperature: f64,
    ) -> AgroResult<Self> {
        if !(1..=31).contains(&days) {
            return Err(AgroError::OutOfRange {
                name: "days",
                value: days as f64,
                expected: "1..=31",
            });
        }

        Ok(Self {
            temperature: ensure_finite("temperature", temperature)?,
            photoperiod: ensure_finite("photoperiod", photoperiod)?,
            days,
            annual_temperature: ensure_finite("annual_temperature", annual_temperature)?,
        })
    }

    /// Camargo variant: uses the effective temperature of the day range
    /// instead of the mean temperature
    pub fn camargo(
        max_temperature: f64,
        min_temperature: f64,
        photoperiod: f64,
        days: u32,
        annual_temperature: f64,
    ) -> AgroResult<Self> {
        let tef = effective_temperature(max_temperature, min_temperature)?;
        Self::new(tef, photoperiod, days, annual_temperature)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Annual heat index (I)
    pub fn heat_index(&self) -> f64 {
        round2(12.0 * (0.2 * self.annual_temperature).powf(1.514))
    }

    /// Exponent (a) of the standard ETp formula
    pub fn exponent(&self, heat_index: f64) -> f64 {
        let i = heat_index;
        round2(0.49239 + 1.7912e-2 * i - 7.71e-5 * i.powi(2) + 6.75e-7 * i.powi(3))
    }

    /// Photoperiod and month length correction
    pub fn correction(&self) -> f64 {
        round2(self.photoperiod / 12.0 * self.days as f64 / 30.0)
    }

    /// Standard ETp (mm/month, 30 days of 12 hours)
    pub fn standard_et(&self) -> AgroResult<f64> {
        let t = self.temperature;
        if t < 0.0 {
            return Ok(0.0);
        }
        if t > MAX_STANDARD_TEMPERATURE {
            return Ok(round2(-415.85 + 32.24 * t - 0.43 * t.powi(2)));
        }

        let i = self.heat_index();
        if i.is_nan() || i <= 0.0 {
            return Err(AgroError::InvalidInput(
                "annual temperature must be above 0 °C".to_string(),
            ));
        }
        let a = self.exponent(i);
        Ok(round2(16.0 * (10.0 * t / i).powf(a)))
    }

    /// Reference evapotranspiration for the month (mm/month)
    pub fn monthly(&self) -> AgroResult<f64> {
        Ok(round2(self.correction() * self.standard_et()?))
    }

    /// Reference evapotranspiration per day (mm/day)
    pub fn daily(&self) -> AgroResult<f64> {
        Ok(round2(self.correction() * self.standard_et()? / self.days as f64))
    }
}

/// Camargo effective temperature from the daily extremes (°C)
pub fn effective_temperature(max_temperature: f64, min_temperature: f64) -> AgroResult<f64> {
    let max = ensure_finite("max_temperature", max_temperature)?;
    let min = ensure_finite("min_temperature", min_temperature)?;
    if max <= min {
        return Err(AgroError::InvalidInput(
            "max temperature must be greater than min temperature".to_string(),
        ));
    }
    Ok(round2(0.36 * (3.0 * max - min)))
}

/// Crop development stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    Establishment,
    VegetativeGrowth,
    Flowering,
    Fruiting,
    Ripening,
}

impl DevelopmentStage {
    pub const ALL: [DevelopmentStage; 5] = [
        DevelopmentStage::Establishment,
        DevelopmentStage::VegetativeGrowth,
        DevelopmentStage::Flowering,
        DevelopmentStage::Fruiting,
        DevelopmentStage::Ripening,
    ];
}

/// Crop coefficient intervals of a culture, by stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KcSpec {
    pub culture: &'static str,
    pub establishment: Range,
    pub vegetative_growth: Range,
    pub flowering: Range,
    pub fruiting: Range,
    pub ripening: Range,
}

impl KcSpec {
    /// Kc interval for a stage
    pub fn stage(&self, stage: DevelopmentStage) -> Range {
        match stage {
            DevelopmentStage::Establishment => self.establishment,
            DevelopmentStage::VegetativeGrowth => self.vegetative_growth,
            DevelopmentStage::Flowering => self.flowering,
            DevelopmentStage::Fruiting => self.fruiting,
            DevelopmentStage::Ripening => self.ripening,
        }
    }

    /// Crop coefficients for every stage
    ///
    /// Humid and calm weather (RH > 70 %, wind < 5 m/s) selects the lower
    /// limits, dry and windy weather (RH < 70 %, wind > 5 m/s) the upper
    /// limits. Anything else, or missing weather, uses the averages.
    pub fn coefficients(
        &self,
        relative_humidity: Option<f64>,
        wind_speed: Option<f64>,
    ) -> AgroResult<CropCoefficients> {
        let pick: fn(&Range) -> f64 = match (relative_humidity, wind_speed) {
            (Some(rh), Some(wind)) => {
                if !(0.0..=100.0).contains(&rh) {
                    return Err(AgroError::OutOfRange {
                        name: "relative_humidity",
                        value: rh,
                        expected: "0..=100",
                    });
                }
                if rh > 70.0 && wind < 5.0 {
                    |r| r.min
                } else if rh < 70.0 && wind > 5.0 {
                    |r| r.max
                } else {
                    Range::average
                }
            }
            _ => Range::average,
        };

        Ok(CropCoefficients {
            establishment: pick(&self.establishment),
            vegetative_growth: pick(&self.vegetative_growth),
            flowering: pick(&self.flowering),
            fruiting: pick(&self.fruiting),
            ripening: pick(&self.ripening),
        })
    }
}

/// Selected crop coefficients by stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropCoefficients {
    pub establishment: f64,
    pub vegetative_growth: f64,
    pub flowering: f64,
    pub fruiting: f64,
    pub ripening: f64,
}

const fn kc(
    culture: &'static str,
    establishment: (f64, f64),
    vegetative_growth: (f64, f64),
    flowering: (f64, f64),
    fruiting: (f64, f64),
    ripening: (f64, f64),
) -> KcSpec {
    KcSpec {
        culture,
        establishment: Range::new(establishment.0, establishment.1),
        vegetative_growth: Range::new(vegetative_growth.0, vegetative_growth.1),
        flowering: Range::new(flowering.0, flowering.1),
        fruiting: Range::new(fruiting.0, fruiting.1),
        ripening: Range::new(ripening.0, ripening.1),
    }
}

/// Crop coefficient table, sorted by culture name
pub const KC_TABLE: &[KcSpec] = &[
    kc("alfalfa1", (0.3, 0.4), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (1.05, 1.2)),
    kc("alfalfa2", (0.3, 0.4), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (1.05, 1.2)),
    kc("banana_subtropical", (0.5, 0.65), (0.8, 0.9), (1.0, 1.2), (1.0, 1.15), (1.0, 1.15)),
    kc("banana_tropical", (0.4, 0.5), (0.7, 0.85), (1.0, 1.1), (0.9, 1.0), (0.75, 0.85)),
    kc("bean", (0.3, 0.4), (0.7, 0.8), (1.05, 1.2), (0.65, 0.75), (0.25, 0.3)),
    kc("beet", (0.4, 0.5), (0.75, 0.85), (1.05, 1.2), (0.9, 1.0), (0.6, 0.7)),
    kc("cabbage", (0.4, 0.5), (0.7, 0.8), (0.95, 1.1), (0.9, 1.0), (0.8, 0.95)),
    kc("citrus", (1.0, 1.0), (1.0, 1.0), (0.65, 0.75), (1.0, 1.0), (1.0, 1.0)),
    kc("citrus_untreated", (1.0, 1.0), (1.0, 1.0), (0.65, 0.75), (1.0, 1.0), (1.0, 1.0)),
    kc("coffee", (1.0, 1.0), (1.0, 1.0), (0.65, 0.8), (1.0, 1.0), (1.0, 1.0)),
    kc("coffee_untreated", (1.0, 1.0), (1.0, 1.0), (0.85, 0.9), (1.0, 1.0), (1.0, 1.0)),
    kc("corn", (0.3, 0.5), (0.7, 0.85), (1.05, 1.2), (0.8, 0.95), (0.55, 0.6)),
    kc("cotton", (0.4, 0.5), (0.7, 0.8), (0.7, 0.8), (0.8, 0.9), (0.65, 0.7)),
    kc("grape", (0.35, 0.55), (0.6, 0.8), (0.7, 0.9), (0.6, 0.8), (0.55, 0.7)),
    kc("green_bean", (0.3, 0.4), (0.65, 0.75), (0.95, 1.05), (0.9, 0.95), (0.85, 0.95)),
    kc("olive", (1.0, 1.0), (1.0, 1.0), (0.4, 0.6), (1.0, 1.0), (1.0, 1.0)),
    kc("onion", (0.4, 0.6), (0.7, 0.8), (0.95, 1.1), (0.85, 0.9), (0.85, 0.9)),
    kc("onion_wet", (0.4, 0.6), (0.6, 0.75), (0.95, 1.05), (0.95, 1.05), (0.95, 1.05)),
    kc("pea_grain", (0.4, 0.5), (0.7, 0.85), (1.05, 1.2), (1.0, 1.15), (0.95, 1.1)),
    kc("pea_legume", (0.4, 0.5), (0.7, 0.85), (1.05, 1.2), (1.0, 1.15), (0.95, 1.1)),
    kc("peanut", (0.4, 0.5), (0.7, 0.8), (0.95, 1.1), (0.75, 0.85), (0.55, 0.6)),
    kc("pepper", (0.3, 0.4), (0.6, 0.75), (0.95, 1.1), (0.85, 1.0), (0.8, 0.9)),
    kc("pepper_green", (0.3, 0.4), (0.6, 0.75), (0.95, 1.1), (0.85, 1.0), (0.8, 0.9)),
    kc("potato", (0.4, 0.5), (0.7, 0.8), (1.05, 1.2), (0.85, 0.95), (0.7, 0.75)),
    kc("rice", (0.4, 0.5), (0.7, 0.8), (0.9, 1.2), (0.8, 0.9), (0.5, 0.6)),
    kc("rubber_tree", (1.0, 1.0), (1.0, 1.0), (0.7, 1.2), (1.0, 1.0), (1.0, 1.0)),
    kc("sorghum", (0.3, 0.4), (0.7, 0.75), (1.0, 1.15), (0.75, 0.8), (0.5, 0.55)),
    kc("soy", (0.3, 0.4), (0.7, 0.8), (1.0, 1.15), (0.7, 0.8), (0.4, 0.5)),
    kc("sugarcane", (0.4, 0.5), (0.7, 1.0), (1.0, 1.3), (0.75, 0.8), (0.5, 0.6)),
    kc("sunflower", (0.3, 0.4), (0.7, 0.8), (1.05, 1.2), (0.7, 0.8), (0.35, 0.45)),
    kc("sweet_corn", (0.3, 0.5), (0.7, 0.9), (1.05, 1.2), (1.0, 1.15), (0.9, 1.1)),
    kc("tobacco", (0.3, 0.4), (0.7, 0.8), (1.0, 1.2), (0.9, 1.0), (0.75, 0.85)),
    kc("tomato", (0.4, 0.5), (0.7, 0.8), (1.05, 1.25), (0.8, 0.95), (0.6, 0.65)),
    kc("watermelon", (0.4, 0.5), (0.7, 0.8), (0.95, 1.05), (0.8, 0.9), (0.65, 0.75)),
    kc("wheat", (0.3, 0.4), (0.7, 0.8), (1.05, 1.2), (0.65, 0.75), (0.2, 0.25)),
];

/// Look up the crop coefficients of a culture
pub fn kc_spec(culture: &str) -> AgroResult<&'static KcSpec> {
    let name = culture.trim().to_lowercase();
    KC_TABLE
        .iter()
        .find(|spec| spec.culture == name)
        .ok_or_else(|| AgroError::UnknownCulture(culture.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_month_length() {
        assert!(Thornthwaite::new(20.0, 12.0, 0, 21.0).is_err());
        assert!(Thornthwaite::new(20.0, 12.0, 32, 21.0).is_err());
        assert!(Thornthwaite::new(20.0, 12.0, 31, 21.0).is_ok());
        assert!(Thornthwaite::new(f64::NAN, 12.0, 30, 21.0).is_err());
    }

    #[test]
    fn test_correction() {
        let et = Thornthwaite::new(20.0, 12.0, 30, 21.0).unwrap();
        assert_eq!(et.correction(), 1.0);

        let et = Thornthwaite::new(20.0, 13.4, 31, 21.0).unwrap();
        // 13.4 / 12 * 31 / 30 = 1.1539
        assert_eq!(et.correction(), 1.15);
    }

    #[test]
    fn test_standard_et_at_heat_index_temperature() {
        let probe = Thornthwaite::new(20.0, 12.0, 30, 21.1).unwrap();
        let i = probe.heat_index();
        assert!(i > 100.0 && i < 110.0, "heat index {}", i);

        // 10T / I == 1 makes ETp independent of the exponent
        let et = Thornthwaite::new(i / 10.0, 12.0, 30, 21.1).unwrap();
        assert_eq!(et.standard_et().unwrap(), 16.0);
        assert_eq!(et.monthly().unwrap(), 16.0);
        assert_eq!(et.daily().unwrap(), 0.53);
    }

    #[test]
    fn test_hot_month_formula() {
        let et = Thornthwaite::new(30.0, 12.0, 30, 21.1).unwrap();
        // -415.85 + 967.2 - 387
        assert_eq!(et.standard_et().unwrap(), 164.35);
        assert_eq!(et.monthly().unwrap(), 164.35);
        assert_eq!(et.daily().unwrap(), 5.48);
    }

    #[test]
    fn test_et_grows_with_temperature() {
        let cool = Thornthwaite::new(12.0, 12.0, 30, 21.1).unwrap();
        let warm = Thornthwaite::new(24.0, 12.0, 30, 21.1).unwrap();
        assert!(warm.monthly().unwrap() > cool.monthly().unwrap());
    }

    #[test]
    fn test_freezing_month_has_no_et() {
        let et = Thornthwaite::new(-3.0, 10.0, 31, 21.1).unwrap();
        assert_eq!(et.monthly().unwrap(), 0.0);
    }

    #[test]
    fn test_cold_year_is_rejected() {
        let et = Thornthwaite::new(5.0, 10.0, 31, -2.0).unwrap();
        assert!(et.monthly().is_err());
    }

    #[test]
    fn test_effective_temperature() {
        // 0.36 * (90 - 15)
        assert_eq!(effective_temperature(30.0, 15.0).unwrap(), 27.0);
        assert!(effective_temperature(10.0, 13.0).is_err());
        assert!(effective_temperature(10.0, 10.0).is_err());

        let et = Thornthwaite::camargo(30.0, 15.0, 12.0, 30, 21.1).unwrap();
        assert_eq!(et.temperature(), 27.0);
    }

    #[test]
    fn test_kc_table_is_sorted_and_ordered() {
        for pair in KC_TABLE.windows(2) {
            assert!(pair[0].culture < pair[1].culture, "{}", pair[1].culture);
        }
        for spec in KC_TABLE {
            for stage in DevelopmentStage::ALL {
                let range = spec.stage(stage);
                assert!(range.min <= range.max, "{} {:?}", spec.culture, stage);
            }
        }
    }

    #[test]
    fn test_kc_selection_by_weather() {
        let soy = kc_spec("soy").unwrap();

        let humid_calm = soy.coefficients(Some(80.0), Some(2.0)).unwrap();
        assert_eq!(humid_calm.flowering, 1.0);

        let dry_windy = soy.coefficients(Some(40.0), Some(8.0)).unwrap();
        assert_eq!(dry_windy.flowering, 1.15);

        let mixed = soy.coefficients(Some(80.0), Some(8.0)).unwrap();
        assert!((mixed.flowering - 1.075).abs() < 1e-12);

        let unknown = soy.coefficients(None, None).unwrap();
        assert!((unknown.establishment - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_kc_lookup() {
        assert!(kc_spec("SOY").is_ok());
        assert_eq!(
            kc_spec("rubber_tree").unwrap().stage(DevelopmentStage::Flowering).max,
            1.2
        );
        assert!(kc_spec("kale").is_err());
    }

    #[test]
    fn test_kc_rejects_bad_humidity() {
        let soy = kc_spec("soy").unwrap();
        assert!(soy.coefficients(Some(120.0), Some(1.0)).is_err());
        assert!(soy.coefficients(Some(-1.0), Some(1.0)).is_err());
    }
}
