//! Crop Model
//!
//! Combines the radiation, evapotranspiration and productivity pieces into
//! a single estimate per station reading:
//!
//! 1. Ho and the photoperiod N from the reading date and the crop latitude
//! 2. sunshine ratio n/N from the measured illuminance
//! 3. potential productivity with the temperature, leaf area, breathing and
//!    harvest fixes
//! 4. daily Thornthwaite ETo, crop ETc from Kc, reduced by the soil water
//!    available to the crop
//! 5. obtainable productivity from the ETc ratio and the yield response ky

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::crop::{harvest_spec, HarvestSpec};
use super::error::{ensure_finite, AgroError, AgroResult};
use super::evapotranspiration::Thornthwaite;
use super::fixes::{
    breathing_fix, leaf_area_fix, lux_to_sunshine_ratio, soil_moisture_to_mm, TemperatureFix,
};
use super::productivity::{AreaUnit, PotentialProductivity, YieldResponse};
use super::radiation::SolarGeometry;

/// Crop and site parameters of the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropParameters {
    /// Culture name (see the harvest table)
    #[serde(default = "default_culture")]
    pub culture: String,

    /// Yield response factor
    #[serde(default = "default_ky")]
    pub ky: f64,

    /// Site latitude in degrees, south negative
    #[serde(default = "default_latitude")]
    pub latitude: f64,

    /// Crop coefficient applied to ETo
    #[serde(default = "default_kc")]
    pub kc: f64,

    /// Mean annual temperature of the site (°C)
    #[serde(default = "default_annual_temperature")]
    pub annual_temperature: f64,

    /// Length of the crop cycle in days
    #[serde(default = "default_cycle_days")]
    pub cycle_days: u32,

    /// Peak leaf area index
    #[serde(default = "default_peak_lai")]
    pub peak_leaf_area_index: f64,

    /// Available water content of the soil (mm)
    #[serde(default = "default_awc")]
    pub awc: f64,

    /// Temperature fix family
    #[serde(default = "default_temperature_fix")]
    pub temperature_fix: TemperatureFix,

    /// Unit of the productivity figures
    #[serde(default)]
    pub unit: AreaUnit,
}

fn default_culture() -> String {
    "potato".to_string()
}

fn default_ky() -> f64 {
    1.1
}

fn default_latitude() -> f64 {
    51.5044968
}

fn default_kc() -> f64 {
    0.8
}

fn default_annual_temperature() -> f64 {
    19.0
}

fn default_cycle_days() -> u32 {
    130
}

fn default_peak_lai() -> f64 {
    3.0
}

fn default_awc() -> f64 {
    35.0
}

fn default_temperature_fix() -> TemperatureFix {
    TemperatureFix::C3Winter
}

impl Default for CropParameters {
    fn default() -> Self {
        Self {
            culture: default_culture(),
            ky: default_ky(),
            latitude: default_latitude(),
            kc: default_kc(),
            annual_temperature: default_annual_temperature(),
            cycle_days: default_cycle_days(),
            peak_leaf_area_index: default_peak_lai(),
            awc: default_awc(),
            temperature_fix: default_temperature_fix(),
            unit: AreaUnit::default(),
        }
    }
}

/// Sensor values the model runs on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelInputs {
    /// Soil moisture (%)
    pub soil_moisture: f64,
    /// Mean air temperature (°C)
    pub temperature: f64,
    /// Illuminance (lux)
    pub illuminance: f64,
    /// Local date and time of the reading
    pub date: NaiveDateTime,
}

/// Model output attached to every station reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityEstimate {
    pub potential_productivity: f64,
    pub obtainable_productivity: f64,
    /// Real crop evapotranspiration (mm/day)
    pub etc: f64,
    /// Reference evapotranspiration (mm/day)
    pub eto: f64,
}

/// Configured crop model
#[derive(Debug, Clone)]
pub struct CropModel {
    params: CropParameters,
    harvest: &'static HarvestSpec,
    response: YieldResponse,
}

impl CropModel {
    /// Validate the parameters and build the model
    pub fn new(params: CropParameters) -> AgroResult<Self> {
        let harvest = harvest_spec(&params.culture)?;
        let response = YieldResponse::new(params.ky)?;

        let latitude = ensure_finite("latitude", params.latitude)?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AgroError::OutOfRange {
                name: "latitude",
                value: latitude,
                expected: "-90..=90",
            });
        }
        if params.cycle_days == 0 {
            return Err(AgroError::InvalidInput(
                "cycle_days must be greater than zero".to_string(),
            ));
        }
        if !(ensure_finite("awc", params.awc)? > 0.0) {
            return Err(AgroError::OutOfRange {
                name: "awc",
                value: params.awc,
                expected: "> 0",
            });
        }
        if ensure_finite("kc", params.kc)? < 0.0 {
            return Err(AgroError::OutOfRange {
                name: "kc",
                value: params.kc,
                expected: ">= 0",
            });
        }
        ensure_finite("annual_temperature", params.annual_temperature)?;
        ensure_finite("peak_leaf_area_index", params.peak_leaf_area_index)?;

        Ok(Self {
            params,
            harvest,
            response,
        })
    }

    pub fn parameters(&self) -> &CropParameters {
        &self.params
    }

    pub fn harvest(&self) -> &'static HarvestSpec {
        self.harvest
    }

    /// Run the model on one set of inputs
    pub fn estimate(&self, inputs: &ModelInputs) -> AgroResult<ProductivityEstimate> {
        let soil_moisture = ensure_finite("soil_moisture", inputs.soil_moisture)?;
        let temperature = ensure_finite("temperature", inputs.temperature)?;
        let illuminance = ensure_finite("illuminance", inputs.illuminance)?;
        let date = inputs.date.date();
        let p = &self.params;

        let geometry = SolarGeometry::new(date, p.latitude)?;
        let ho = geometry.extraterrestrial_irradiance();
        let photoperiod = geometry.photoperiod();

        let cloudy_fix = p.temperature_fix.cloudy_days(temperature).max(0.0);
        let clear_fix = p.temperature_fix.clear_days(temperature).max(0.0);
        let potential = PotentialProductivity::new(
            ho,
            cloudy_fix,
            clear_fix,
            lux_to_sunshine_ratio(illuminance),
        )?
        .potential(
            leaf_area_fix(p.peak_leaf_area_index),
            breathing_fix(temperature),
            self.harvest.harvest_fix_average(),
            p.cycle_days,
            p.unit,
        );

        let eto = Thornthwaite::new(
            temperature,
            photoperiod,
            days_in_month(date),
            p.annual_temperature,
        )?
        .daily()?
        .max(0.0);
        let etc_max = eto * p.kc;
        let water_ratio = soil_moisture_to_mm(soil_moisture, p.awc) / p.awc;
        let etc = etc_max * water_ratio;

        Ok(ProductivityEstimate {
            potential_productivity: potential,
            obtainable_productivity: self.response.obtainable(etc, etc_max, potential),
            etc,
            eto,
        })
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(soil_moisture: f64, temperature: f64, illuminance: f64) -> ModelInputs {
        ModelInputs {
            soil_moisture,
            temperature,
            illuminance,
            date: NaiveDate::from_ymd_opt(2016, 6, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_default_parameters() {
        let params = CropParameters::default();
        assert_eq!(params.culture, "potato");
        assert_eq!(params.ky, 1.1);
        assert_eq!(params.cycle_days, 130);
        assert_eq!(params.awc, 35.0);
        assert_eq!(params.temperature_fix, TemperatureFix::C3Winter);
    }

    #[test]
    fn test_parameters_deserialize_with_defaults() {
        let params: CropParameters =
            serde_json::from_str(r#"{"culture": "corn", "temperature_fix": "c4"}"#).unwrap();
        assert_eq!(params.culture, "corn");
        assert_eq!(params.temperature_fix, TemperatureFix::C4);
        assert_eq!(params.kc, 0.8);
    }

    #[test]
    fn test_estimate_summer_reading() {
        let model = CropModel::new(CropParameters::default()).unwrap();
        let estimate = model.estimate(&inputs(40.0, 18.0, 10_000.0)).unwrap();

        assert!(estimate.potential_productivity > 0.0);
        assert!(estimate.obtainable_productivity <= estimate.potential_productivity);
        assert!(estimate.eto > 0.0);
        assert!(estimate.etc > 0.0);
        assert!(estimate.etc <= estimate.eto * 0.8 + 1e-12);
    }

    #[test]
    fn test_saturated_soil_reaches_potential() {
        let model = CropModel::new(CropParameters::default()).unwrap();
        let estimate = model.estimate(&inputs(100.0, 18.0, 10_000.0)).unwrap();
        assert!(
            (estimate.obtainable_productivity - estimate.potential_productivity).abs() < 1e-9
        );
    }

    #[test]
    fn test_dry_soil_loses_yield() {
        let model = CropModel::new(CropParameters::default()).unwrap();
        let estimate = model.estimate(&inputs(0.0, 18.0, 10_000.0)).unwrap();
        assert_eq!(estimate.etc, 0.0);
        assert_eq!(estimate.obtainable_productivity, 0.0);
    }

    #[test]
    fn test_freezing_reading_keeps_potential() {
        let model = CropModel::new(CropParameters::default()).unwrap();
        let estimate = model.estimate(&inputs(20.0, -5.0, 500.0)).unwrap();
        assert_eq!(estimate.eto, 0.0);
        assert_eq!(
            estimate.obtainable_productivity,
            estimate.potential_productivity
        );
    }

    #[test]
    fn test_square_meter_unit() {
        let model = CropModel::new(CropParameters::default()).unwrap();
        let per_m2 = CropModel::new(CropParameters {
            unit: AreaUnit::KgPerSquareMeter,
            ..CropParameters::default()
        })
        .unwrap();

        let reading = inputs(40.0, 18.0, 10_000.0);
        let ha = model.estimate(&reading).unwrap().potential_productivity;
        let m2 = per_m2.estimate(&reading).unwrap().potential_productivity;
        assert!((ha / 10_000.0 - m2).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_parameters() {
        let unknown = CropParameters {
            culture: "kale".to_string(),
            ..CropParameters::default()
        };
        assert!(matches!(
            CropModel::new(unknown),
            Err(AgroError::UnknownCulture(_))
        ));

        let no_cycle = CropParameters {
            cycle_days: 0,
            ..CropParameters::default()
        };
        assert!(CropModel::new(no_cycle).is_err());

        let bad_latitude = CropParameters {
            latitude: 120.0,
            ..CropParameters::default()
        };
        assert!(CropModel::new(bad_latitude).is_err());
    }

    #[test]
    fn test_rejects_non_finite_inputs() {
        let model = CropModel::new(CropParameters::default()).unwrap();
        assert!(model.estimate(&inputs(f64::NAN, 18.0, 100.0)).is_err());
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2016, 2, 10).unwrap()), 29);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2017, 2, 10).unwrap()), 28);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2016, 12, 31).unwrap()), 31);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2016, 6, 1).unwrap()), 30);
    }
}
