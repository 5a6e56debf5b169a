//! LabMet CLI
//!
//! Command-line client for a LabMet server, and an offline calculator
//! for the crop model:
//! - Check status and station data
//! - Send a manual reading
//! - Run the crop model and the water balance locally
//! - Browse the culture tables

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use labmet::agro::{
    harvest_spec, kc_spec, AreaUnit, CropModel, CropParameters, DevelopmentStage, ModelInputs,
    TemperatureFix, WaterBalance, WaterBalancePeriod, HARVEST_TABLE, KC_TABLE,
};
use labmet::station::{parse_collected_at, SensorValues, StationId, StationReading};

#[derive(Parser)]
#[command(name = "labmet-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Weather station monitoring with crop productivity estimates")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:5000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status
    Status,

    /// Show the latest data of every station, or one station's history
    Stations {
        /// Station id
        id: Option<StationId>,
        /// Number of recent readings (with an id)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Send a manual reading to the server
    Send {
        /// Soil moisture (%)
        #[arg(long)]
        soil: f64,
        /// Air temperature (°C)
        #[arg(long)]
        temperature: f64,
        /// Illuminance (lux)
        #[arg(long)]
        lux: f64,
        /// Relative humidity (%)
        #[arg(long)]
        humidity: Option<f64>,
        /// Station id (default: server default)
        #[arg(short, long)]
        station: Option<StationId>,
    },

    /// Run the crop model locally
    Estimate {
        /// Soil moisture (%)
        #[arg(long)]
        soil: f64,
        /// Air temperature (°C)
        #[arg(long)]
        temperature: f64,
        /// Illuminance (lux)
        #[arg(long)]
        lux: f64,
        /// Reading time, station format or RFC 3339 (default: now)
        #[arg(long)]
        date: Option<String>,
        #[command(flatten)]
        crop: CropArgs,
    },

    /// Run a sequential water balance locally
    Balance {
        /// Available water content (mm)
        #[arg(long, default_value = "100")]
        awc: f64,
        /// Soil water at the start (mm)
        #[arg(long, default_value = "0")]
        initial: f64,
        /// Periods as PRECIPITATION:PET, in order
        #[arg(required = true)]
        periods: Vec<String>,
    },

    /// Browse the culture tables
    Cultures {
        /// Culture name (default: list all)
        name: Option<String>,
        /// Relative humidity (%) used to pick crop coefficients
        #[arg(long)]
        humidity: Option<f64>,
        /// Wind speed (m/s) used to pick crop coefficients
        #[arg(long)]
        wind: Option<f64>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Crop parameters for local model runs
#[derive(clap::Args)]
pub struct CropArgs {
    /// Culture
    #[arg(long, default_value = "potato")]
    culture: String,
    /// Site latitude (south negative)
    #[arg(long, default_value = "51.5044968", allow_hyphen_values = true)]
    latitude: f64,
    /// Yield response factor
    #[arg(long, default_value = "1.1")]
    ky: f64,
    /// Crop coefficient
    #[arg(long, default_value = "0.8")]
    kc: f64,
    /// Mean annual temperature (°C)
    #[arg(long, default_value = "19", allow_hyphen_values = true)]
    annual_temperature: f64,
    /// Crop cycle in days
    #[arg(long, default_value = "130")]
    cycle_days: u32,
    /// Temperature fix family (c3_winter, c3_summer, c4)
    #[arg(long, default_value = "c3_winter")]
    temperature_fix: String,
    /// Report kg/m² instead of kg/ha
    #[arg(long)]
    per_square_meter: bool,
}

impl CropArgs {
    fn parameters(&self) -> Result<CropParameters, Box<dyn std::error::Error>> {
        let temperature_fix = match self.temperature_fix.to_lowercase().as_str() {
            "c3_winter" | "c3-winter" => TemperatureFix::C3Winter,
            "c3_summer" | "c3-summer" => TemperatureFix::C3Summer,
            "c4" => TemperatureFix::C4,
            other => return Err(format!("Unknown temperature fix: {}", other).into()),
        };

        Ok(CropParameters {
            culture: self.culture.clone(),
            latitude: self.latitude,
            ky: self.ky,
            kc: self.kc,
            annual_temperature: self.annual_temperature,
            cycle_days: self.cycle_days,
            temperature_fix,
            unit: if self.per_square_meter {
                AreaUnit::KgPerSquareMeter
            } else {
                AreaUnit::KgPerHectare
            },
            ..CropParameters::default()
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    if cli.format == "json" {
                        println!("{}", serde_json::to_string_pretty(&health)?);
                        return Ok(());
                    }

                    println!(
                        "LabMet server v{}",
                        health["version"].as_str().unwrap_or("unknown")
                    );
                    println!();
                    println!("Status:      {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Broker:      {}", health["mqtt"].as_str().unwrap_or("unknown"));
                    println!("Stations:    {}", health["stations"].as_u64().unwrap_or(0));
                    println!("Dashboards:  {}", health["connections"].as_u64().unwrap_or(0));

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime:      {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to LabMet API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the LabMet server is running:");
                    eprintln!("  cargo run --bin labmet");
                    std::process::exit(1);
                }
            }
        }

        Commands::Stations { id, limit } => {
            let url = match id {
                Some(id) => format!("{}/api/v1/stations/{}/history?limit={}", cli.api_url, id, limit),
                None => format!("{}/api/v1/stations", cli.api_url),
            };
            let response = client.get(&url).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                eprintln!("Request failed ({}): {}", status, text);
                std::process::exit(1);
            }

            let body: serde_json::Value = response.json().await?;
            let rows = match id {
                Some(_) => &body["readings"],
                None => &body["stations"],
            };

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(rows)?);
            } else {
                print_stations(rows);
            }
        }

        Commands::Send {
            soil,
            temperature,
            lux,
            humidity,
            station,
        } => {
            let reading = StationReading {
                id: station,
                collected_at: Some(
                    Local::now()
                        .format(labmet::station::COLLECTED_AT_FORMAT)
                        .to_string(),
                ),
                sensors: SensorValues {
                    ds18b20_temp: temperature,
                    bh1750_illuminance: lux,
                    analog_soil_moisture: soil,
                    dht22_humid: humidity,
                    ..SensorValues::default()
                },
            };
            reading.validate()?;

            let response = client
                .post(format!("{}/api/v1/ingest", cli.api_url))
                .json(&reading)
                .send()
                .await?;

            if response.status().is_success() {
                let data: serde_json::Value = response.json().await?;
                println!(
                    "Station #{}: potential {:.2} kg/ha, obtainable {:.2} kg/ha",
                    data["id"].as_u64().unwrap_or(0),
                    data["potential_productivity"].as_f64().unwrap_or(0.0),
                    data["obtainable_productivity"].as_f64().unwrap_or(0.0),
                );
            } else {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                eprintln!("Failed ({}): {}", status, text);
                std::process::exit(1);
            }
        }

        Commands::Estimate {
            soil,
            temperature,
            lux,
            date,
            crop,
        } => {
            let model = CropModel::new(crop.parameters()?)?;
            let date = match date.as_deref() {
                Some(text) => parse_collected_at(text)?,
                None => Local::now().naive_local(),
            };

            let estimate = model.estimate(&ModelInputs {
                soil_moisture: soil,
                temperature,
                illuminance: lux,
                date,
            })?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                let unit = model.parameters().unit.symbol();
                println!("{} at {}", model.parameters().culture, format_date(date));
                println!();
                println!("Potential productivity:   {:>10.2} {}", estimate.potential_productivity, unit);
                println!("Obtainable productivity:  {:>10.2} {}", estimate.obtainable_productivity, unit);
                println!("Real water usage (ETc):   {:>10.2} mm", estimate.etc);
                println!("Potential water usage:    {:>10.2} mm", estimate.eto);
            }
        }

        Commands::Balance {
            awc,
            initial,
            periods,
        } => {
            let periods = periods
                .iter()
                .map(|p| parse_period(p))
                .collect::<Result<Vec<_>, _>>()?;
            let steps = WaterBalance::run(awc, initial, &periods)?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                println!(
                    "{:>4} {:>8} {:>8} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8}",
                    "#", "P", "PET", "P-PET", "NegAcc", "ARM", "ALT", "ETR", "DEF", "EXC"
                );
                println!("{}", "-".repeat(88));
                for (i, s) in steps.iter().enumerate() {
                    println!(
                        "{:>4} {:>8.2} {:>8.2} {:>8.2} {:>9.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                        i + 1,
                        s.precipitation,
                        s.pet,
                        s.precipitation_pet,
                        s.accumulated_negative,
                        s.soil_water_moisture,
                        s.variation,
                        s.real_et,
                        s.deficit,
                        s.excess
                    );
                }
            }
        }

        Commands::Cultures {
            name,
            humidity,
            wind,
        } => match name {
            Some(name) => print_culture(&name, humidity, wind, &cli.format)?,
            None => {
                if cli.format == "json" {
                    #[derive(Serialize)]
                    struct Tables {
                        harvest: &'static [labmet::agro::HarvestSpec],
                        crop_coefficients: &'static [labmet::agro::KcSpec],
                    }
                    let tables = Tables {
                        harvest: HARVEST_TABLE,
                        crop_coefficients: KC_TABLE,
                    };
                    println!("{}", serde_json::to_string_pretty(&tables)?);
                } else {
                    println!("{:<16} {:<14} {:>11} {:>10}", "Culture", "Part", "Harvest fix", "Humidity");
                    println!("{}", "-".repeat(54));
                    for spec in HARVEST_TABLE {
                        println!(
                            "{:<16} {:<14} {:>11} {:>10}",
                            spec.culture,
                            spec.harvested_part,
                            format!("{:.2}-{:.2}", spec.harvest_fix.min, spec.harvest_fix.max),
                            format!("{:.0}-{:.0}%", spec.humidity.min, spec.humidity.max),
                        );
                    }
                    println!();
                    println!("{} cultures with crop coefficients", KC_TABLE.len());
                }
            }
        },

        Commands::Config { output } => {
            let config = labmet::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_culture(
    name: &str,
    humidity: Option<f64>,
    wind: Option<f64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let harvest = harvest_spec(name).ok();
    let kc = kc_spec(name).ok();

    if harvest.is_none() && kc.is_none() {
        return Err(format!("Unknown culture: {}", name).into());
    }

    let selected = kc.map(|spec| spec.coefficients(humidity, wind)).transpose()?;

    if format == "json" {
        let body = serde_json::json!({
            "harvest": harvest,
            "crop_coefficients": kc,
            "selected": selected,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if let Some(spec) = harvest {
        println!("{} ({})", spec.culture, spec.harvested_part);
        println!(
            "  Harvest fix: {:.2} - {:.2} (avg {:.3})",
            spec.harvest_fix.min,
            spec.harvest_fix.max,
            spec.harvest_fix_average()
        );
        println!("  Humidity:    {:.0} - {:.0} %", spec.humidity.min, spec.humidity.max);
    }

    if let (Some(spec), Some(selected)) = (kc, selected) {
        println!();
        println!("{:<18} {:>11} {:>9}", "Stage", "Kc range", "Kc");
        println!("{}", "-".repeat(40));
        let values = [
            selected.establishment,
            selected.vegetative_growth,
            selected.flowering,
            selected.fruiting,
            selected.ripening,
        ];
        for (stage, value) in DevelopmentStage::ALL.iter().zip(values) {
            let range = spec.stage(*stage);
            println!(
                "{:<18} {:>11} {:>9.3}",
                format!("{:?}", stage),
                format!("{:.2}-{:.2}", range.min, range.max),
                value
            );
        }
    }

    Ok(())
}

fn parse_period(s: &str) -> Result<WaterBalancePeriod, Box<dyn std::error::Error>> {
    let (precipitation, pet) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid period '{}'. Use PRECIPITATION:PET, e.g. 120:40", s))?;

    Ok(WaterBalancePeriod {
        precipitation: precipitation.trim().parse()?,
        pet: pet.trim().parse()?,
    })
}

fn format_date(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_stations(rows: &serde_json::Value) {
    let rows = match rows.as_array() {
        Some(r) if !r.is_empty() => r,
        _ => {
            println!("No station has reported yet");
            return;
        }
    };

    println!(
        "{:<6} {:<20} {:>8} {:>8} {:>8} {:>12} {:>12}",
        "ID", "Collected", "Temp", "Soil", "Lux", "Potential", "Obtainable"
    );
    println!("{}", "-".repeat(80));

    for row in rows {
        let number = |key: &str| {
            row[key]
                .as_f64()
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:<6} {:<20} {:>8} {:>8} {:>8} {:>12} {:>12}",
            row["id"].as_u64().unwrap_or(0),
            row["collected_at"].as_str().unwrap_or("-"),
            number("ds18b20_temp"),
            number("analog_soil_moisture"),
            number("bh1750_illuminance"),
            number("potential_productivity"),
            number("obtainable_productivity"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        let period = parse_period("120:40.5").unwrap();
        assert_eq!(period.precipitation, 120.0);
        assert_eq!(period.pet, 40.5);
        assert!(parse_period("120").is_err());
        assert!(parse_period("a:b").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(3700), "1h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }
}
