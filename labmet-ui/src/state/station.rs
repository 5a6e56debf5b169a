//! Station View-Model
//!
//! Everything a station card shows, derived from the pushed station data.
//! Plain Rust with no DOM access, so the display rules are unit-tested.

use serde::Deserialize;
use std::collections::VecDeque;

/// Most station cards on the dashboard
pub const MAX_STATIONS: usize = 10;

/// Chart points kept per series
pub const MAX_CHART_POINTS: usize = 100;

/// Obtainable productivity matching a fully grown crop
const FULL_GROWTH_PRODUCTIVITY: f64 = 60.0;

/// Station data pushed by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationPayload {
    pub id: u32,
    #[serde(default)]
    pub collected_at: Option<String>,
    #[serde(default)]
    pub received_at: Option<i64>,
    #[serde(default)]
    pub bmp180_temp: Option<f64>,
    #[serde(default)]
    pub bmp180_alt: Option<f64>,
    #[serde(default)]
    pub bmp180_press: Option<f64>,
    #[serde(default)]
    pub dht22_temp: Option<f64>,
    #[serde(default)]
    pub dht22_humid: Option<f64>,
    #[serde(default)]
    pub ds18b20_temp: Option<f64>,
    #[serde(default)]
    pub bh1750_illuminance: Option<f64>,
    #[serde(default)]
    pub analog_soil_moisture: Option<f64>,
    #[serde(default)]
    pub potential_productivity: f64,
    #[serde(default)]
    pub obtainable_productivity: f64,
    #[serde(default)]
    pub etc: f64,
    #[serde(default)]
    pub eto: f64,
}

/// Unit shown after a value, by payload key
pub fn unit_for(key: &str) -> &'static str {
    match key {
        "bmp180_press" => "Bar",
        "ds18b20_temp" | "bmp180_temp" | "dht22_temp" => "°C",
        "dht22_humid" => "%",
        "analog_soil_moisture" => "%",
        "bh1750_illuminance" => "lux",
        "bmp180_alt" => "m",
        "potential_productivity" | "obtainable_productivity" => "kg/ha",
        "etc" | "eto" => "mm",
        _ => "",
    }
}

/// Two decimals and the unit
pub fn format_reading(value: f64, unit: &str) -> String {
    format!("{:.2} {}", value, unit).trim_end().to_string()
}

pub fn format_station_id(id: u32) -> String {
    format!("# {}", id)
}

/// Sensors shown on a card, in card order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Temperature,
    Altitude,
    Pressure,
    Humidity,
    Illuminance,
    SoilMoisture,
}

impl Sensor {
    pub const ALL: [Sensor; 6] = [
        Sensor::Temperature,
        Sensor::Altitude,
        Sensor::Pressure,
        Sensor::Humidity,
        Sensor::Illuminance,
        Sensor::SoilMoisture,
    ];

    /// Payload key
    pub fn key(self) -> &'static str {
        match self {
            Sensor::Temperature => "ds18b20_temp",
            Sensor::Altitude => "bmp180_alt",
            Sensor::Pressure => "bmp180_press",
            Sensor::Humidity => "dht22_humid",
            Sensor::Illuminance => "bh1750_illuminance",
            Sensor::SoilMoisture => "analog_soil_moisture",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sensor::Temperature => "Temperature",
            Sensor::Altitude => "Altitude",
            Sensor::Pressure => "Pressure",
            Sensor::Humidity => "Humidity",
            Sensor::Illuminance => "Illuminance",
            Sensor::SoilMoisture => "Soil Moisture",
        }
    }

    pub fn unit(self) -> &'static str {
        unit_for(self.key())
    }

    pub fn value(self, payload: &StationPayload) -> Option<f64> {
        match self {
            Sensor::Temperature => payload.ds18b20_temp,
            Sensor::Altitude => payload.bmp180_alt,
            Sensor::Pressure => payload.bmp180_press,
            Sensor::Humidity => payload.dht22_humid,
            Sensor::Illuminance => payload.bh1750_illuminance,
            Sensor::SoilMoisture => payload.analog_soil_moisture,
        }
    }

    /// Alert level of a value
    pub fn level(self, value: f64) -> ReadingLevel {
        match self {
            Sensor::SoilMoisture if value < 10.0 => ReadingLevel::Danger,
            Sensor::SoilMoisture if value < 20.0 => ReadingLevel::Warning,
            Sensor::Temperature if !(0.0..=40.0).contains(&value) => ReadingLevel::Danger,
            Sensor::Temperature if !(5.0..=35.0).contains(&value) => ReadingLevel::Warning,
            Sensor::Humidity if !(20.0..=90.0).contains(&value) => ReadingLevel::Warning,
            _ => ReadingLevel::Ok,
        }
    }
}

/// Label shown next to a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingLevel {
    Ok,
    Warning,
    Danger,
}

impl ReadingLevel {
    pub fn class(self) -> &'static str {
        match self {
            ReadingLevel::Ok => "label-success",
            ReadingLevel::Warning => "label-warning",
            ReadingLevel::Danger => "label-danger",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            ReadingLevel::Ok => "OK",
            ReadingLevel::Warning => "WARN",
            ReadingLevel::Danger => "ALERT",
        }
    }
}

/// Growth percentage of the decorative crop image
///
/// `None` for negative or non-finite productivity.
pub fn growth_percent(obtainable: f64) -> Option<i64> {
    if !obtainable.is_finite() || obtainable < 0.0 {
        return None;
    }
    Some((obtainable / FULL_GROWTH_PRODUCTIVITY).trunc() as i64)
}

/// Size class of the crop image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthStage {
    Sprout,
    Young,
    Half,
    Mature,
    Full,
}

impl GrowthStage {
    /// Stage for a growth percentage; `None` keeps the current stage
    pub fn from_percent(percent: i64) -> Option<Self> {
        match percent {
            1..=15 => Some(GrowthStage::Sprout),
            16..=25 => Some(GrowthStage::Young),
            26..=50 => Some(GrowthStage::Half),
            51..=75 => Some(GrowthStage::Mature),
            76..=100 => Some(GrowthStage::Full),
            _ => None,
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            GrowthStage::Sprout => "potato-15",
            GrowthStage::Young => "potato-25",
            GrowthStage::Half => "potato-50",
            GrowthStage::Mature => "potato-75",
            GrowthStage::Full => "potato-100",
        }
    }
}

/// Productivity history of one station, indexed by arrival
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub obtainable: VecDeque<(u64, f64)>,
    pub potential: VecDeque<(u64, f64)>,
    next_x: u64,
}

impl Default for ChartSeries {
    fn default() -> Self {
        Self {
            obtainable: VecDeque::new(),
            potential: VecDeque::new(),
            next_x: 1,
        }
    }
}

impl ChartSeries {
    /// Append at the current x index, then advance it
    pub fn push(&mut self, potential: f64, obtainable: f64) {
        let x = self.next_x;
        self.potential.push_back((x, potential));
        self.obtainable.push_back((x, obtainable));
        self.next_x += 1;

        while self.potential.len() > MAX_CHART_POINTS {
            self.potential.pop_front();
        }
        while self.obtainable.len() > MAX_CHART_POINTS {
            self.obtainable.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.potential.len()
    }

    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// First and last x shown
    pub fn x_bounds(&self) -> Option<(u64, u64)> {
        Some((self.potential.front()?.0, self.potential.back()?.0))
    }

    /// Largest y of both series
    pub fn y_max(&self) -> f64 {
        self.potential
            .iter()
            .chain(self.obtainable.iter())
            .map(|(_, y)| *y)
            .filter(|y| y.is_finite())
            .fold(0.0, f64::max)
    }
}

/// One line of the readings list
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingView {
    pub sensor: Sensor,
    pub text: String,
    /// `None` when the station did not send the value
    pub level: Option<ReadingLevel>,
}

/// Everything shown on one station card
#[derive(Debug, Clone, PartialEq)]
pub struct StationView {
    pub id: u32,
    pub last_update: String,
    pub readings: Vec<ReadingView>,
    pub potential: String,
    pub obtainable: String,
    pub etc: String,
    pub eto: String,
    pub growth: Option<GrowthStage>,
    pub chart: ChartSeries,
    /// Payloads applied so far
    pub updates: u64,
    last_received_at: Option<i64>,
}

impl StationView {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            last_update: "-".to_string(),
            readings: Vec::new(),
            potential: "-".to_string(),
            obtainable: "-".to_string(),
            etc: "-".to_string(),
            eto: "-".to_string(),
            growth: Some(GrowthStage::Sprout),
            chart: ChartSeries::default(),
            updates: 0,
            last_received_at: None,
        }
    }

    /// Whether `payload` is the data already shown, as replayed on resubscribe
    pub fn is_replay(&self, payload: &StationPayload) -> bool {
        payload.received_at.is_some() && payload.received_at == self.last_received_at
    }

    /// Show a new payload
    ///
    /// Returns `false`, changing nothing, for a replay of the last payload.
    pub fn apply(&mut self, payload: &StationPayload) -> bool {
        if self.is_replay(payload) {
            return false;
        }
        self.last_received_at = payload.received_at;
        self.last_update = last_update_text(payload);

        self.readings = Sensor::ALL
            .iter()
            .map(|&sensor| match sensor.value(payload) {
                Some(value) => ReadingView {
                    sensor,
                    text: format_reading(value, sensor.unit()),
                    level: Some(sensor.level(value)),
                },
                None => ReadingView {
                    sensor,
                    text: "-".to_string(),
                    level: None,
                },
            })
            .collect();

        self.potential = format_reading(
            payload.potential_productivity,
            unit_for("potential_productivity"),
        );
        self.obtainable = format_reading(
            payload.obtainable_productivity,
            unit_for("obtainable_productivity"),
        );
        self.etc = format_reading(payload.etc, unit_for("etc"));
        self.eto = format_reading(payload.eto, unit_for("eto"));

        self.chart
            .push(payload.potential_productivity, payload.obtainable_productivity);

        if let Some(stage) =
            growth_percent(payload.obtainable_productivity).and_then(GrowthStage::from_percent)
        {
            self.growth = Some(stage);
        }

        self.updates += 1;
        true
    }
}

fn last_update_text(payload: &StationPayload) -> String {
    match payload.collected_at.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.replacen('T', " ", 1),
        _ => payload
            .received_at
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|dt| dt.format("%m/%d/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
    }
}

/// Result of applying a payload to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardUpdate {
    Updated,
    Added,
    /// Same data as last shown; nothing changed
    Replayed,
    /// Unknown station while the board is full
    Rejected,
}

/// Station cards, in order of first report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationBoard {
    stations: Vec<StationView>,
}

impl StationBoard {
    pub fn apply(&mut self, payload: &StationPayload) -> BoardUpdate {
        if let Some(view) = self.stations.iter_mut().find(|v| v.id == payload.id) {
            return if view.apply(payload) {
                BoardUpdate::Updated
            } else {
                BoardUpdate::Replayed
            };
        }

        if self.stations.len() >= MAX_STATIONS {
            return BoardUpdate::Rejected;
        }

        let mut view = StationView::new(payload.id);
        view.apply(payload);
        self.stations.push(view);
        BoardUpdate::Added
    }

    pub fn get(&self, id: u32) -> Option<&StationView> {
        self.stations.iter().find(|v| v.id == id)
    }

    pub fn ids(&self) -> Vec<u32> {
        self.stations.iter().map(|v| v.id).collect()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: u32) -> StationPayload {
        serde_json::from_str(&format!(
            r#"{{
                "id": {},
                "collected_at": "06/15/2016T13:45:10",
                "received_at": 1466000000000,
                "bmp180_alt": 812.5,
                "bmp180_press": 1.7,
                "ds18b20_temp": 18.0,
                "dht22_humid": 60.0,
                "bh1750_illuminance": 800,
                "analog_soil_moisture": 25.0,
                "potential_productivity": 2400.0,
                "obtainable_productivity": 1800.0,
                "etc": 2.1,
                "eto": 2.64
            }}"#,
            id
        ))
        .unwrap()
    }

    #[test]
    fn test_unit_for() {
        assert_eq!(unit_for("bmp180_press"), "Bar");
        assert_eq!(unit_for("ds18b20_temp"), "°C");
        assert_eq!(unit_for("dht22_humid"), "%");
        assert_eq!(unit_for("analog_soil_moisture"), "%");
        assert_eq!(unit_for("bh1750_illuminance"), "lux");
        assert_eq!(unit_for("bmp180_alt"), "m");
        assert_eq!(unit_for("obtainable_productivity"), "kg/ha");
        assert_eq!(unit_for("eto"), "mm");
        assert_eq!(unit_for("collected_at"), "");
    }

    #[test]
    fn test_format_reading() {
        assert_eq!(format_reading(18.0, "°C"), "18.00 °C");
        assert_eq!(format_reading(3.14159, ""), "3.14");
        assert_eq!(format_station_id(7), "# 7");
    }

    #[test]
    fn test_sensor_levels() {
        assert_eq!(Sensor::SoilMoisture.level(5.0), ReadingLevel::Danger);
        assert_eq!(Sensor::SoilMoisture.level(15.0), ReadingLevel::Warning);
        assert_eq!(Sensor::SoilMoisture.level(25.0), ReadingLevel::Ok);

        assert_eq!(Sensor::Temperature.level(-2.0), ReadingLevel::Danger);
        assert_eq!(Sensor::Temperature.level(41.0), ReadingLevel::Danger);
        assert_eq!(Sensor::Temperature.level(37.0), ReadingLevel::Warning);
        assert_eq!(Sensor::Temperature.level(3.0), ReadingLevel::Warning);
        assert_eq!(Sensor::Temperature.level(22.0), ReadingLevel::Ok);

        assert_eq!(Sensor::Humidity.level(10.0), ReadingLevel::Warning);
        assert_eq!(Sensor::Humidity.level(95.0), ReadingLevel::Warning);
        assert_eq!(Sensor::Humidity.level(50.0), ReadingLevel::Ok);

        assert_eq!(Sensor::Altitude.level(-100.0), ReadingLevel::Ok);
        assert_eq!(ReadingLevel::Danger.class(), "label-danger");
        assert_eq!(ReadingLevel::Warning.text(), "WARN");
    }

    #[test]
    fn test_growth_percent() {
        assert_eq!(growth_percent(1800.0), Some(30));
        assert_eq!(growth_percent(59.0), Some(0));
        assert_eq!(growth_percent(-1.0), None);
        assert_eq!(growth_percent(f64::NAN), None);
    }

    #[test]
    fn test_growth_stage_boundaries() {
        assert_eq!(GrowthStage::from_percent(0), None);
        assert_eq!(GrowthStage::from_percent(1), Some(GrowthStage::Sprout));
        assert_eq!(GrowthStage::from_percent(15), Some(GrowthStage::Sprout));
        assert_eq!(GrowthStage::from_percent(16), Some(GrowthStage::Young));
        assert_eq!(GrowthStage::from_percent(50), Some(GrowthStage::Half));
        assert_eq!(GrowthStage::from_percent(75), Some(GrowthStage::Mature));
        assert_eq!(GrowthStage::from_percent(100), Some(GrowthStage::Full));
        assert_eq!(GrowthStage::from_percent(101), None);
        assert_eq!(GrowthStage::Full.class(), "potato-100");
    }

    #[test]
    fn test_chart_series_linear_index() {
        let mut series = ChartSeries::default();
        series.push(10.0, 5.0);
        series.push(12.0, 6.0);

        assert_eq!(series.potential, VecDeque::from(vec![(1, 10.0), (2, 12.0)]));
        assert_eq!(series.obtainable, VecDeque::from(vec![(1, 5.0), (2, 6.0)]));
        assert_eq!(series.y_max(), 12.0);
    }

    #[test]
    fn test_chart_series_is_bounded() {
        let mut series = ChartSeries::default();
        for i in 0..(MAX_CHART_POINTS + 5) {
            series.push(i as f64, 0.0);
        }
        assert_eq!(series.len(), MAX_CHART_POINTS);
        assert_eq!(series.x_bounds(), Some((6, MAX_CHART_POINTS as u64 + 5)));
    }

    #[test]
    fn test_station_view_apply() {
        let mut view = StationView::new(3);
        view.apply(&payload(3));

        assert_eq!(view.last_update, "06/15/2016 13:45:10");
        assert_eq!(view.readings.len(), Sensor::ALL.len());
        assert_eq!(view.readings[0].text, "18.00 °C");
        assert_eq!(view.readings[0].level, Some(ReadingLevel::Ok));
        assert_eq!(view.potential, "2400.00 kg/ha");
        assert_eq!(view.eto, "2.64 mm");
        assert_eq!(view.growth, Some(GrowthStage::Half));
        assert_eq!(view.chart.len(), 1);
        assert_eq!(view.updates, 1);
    }

    #[test]
    fn test_missing_sensor_has_no_level() {
        let mut data = payload(1);
        data.bmp180_alt = None;
        let mut view = StationView::new(1);
        view.apply(&data);

        let altitude = &view.readings[1];
        assert_eq!(altitude.sensor, Sensor::Altitude);
        assert_eq!(altitude.text, "-");
        assert_eq!(altitude.level, None);
    }

    #[test]
    fn test_out_of_range_growth_keeps_stage() {
        let mut view = StationView::new(1);
        view.apply(&payload(1));
        assert_eq!(view.growth, Some(GrowthStage::Half));

        let mut huge = payload(1);
        huge.received_at = Some(1466000060000);
        huge.obtainable_productivity = 60.0 * 500.0;
        view.apply(&huge);
        assert_eq!(view.growth, Some(GrowthStage::Half));

        let mut tiny = payload(1);
        tiny.received_at = Some(1466000120000);
        tiny.obtainable_productivity = 10.0;
        view.apply(&tiny);
        assert_eq!(view.growth, Some(GrowthStage::Half));
    }

    #[test]
    fn test_last_update_falls_back_to_received_at() {
        let mut data = payload(1);
        data.collected_at = None;
        data.received_at = Some(0);
        assert_eq!(last_update_text(&data), "01/01/1970 00:00:00");

        data.received_at = None;
        assert_eq!(last_update_text(&data), "-");
    }

    #[test]
    fn test_board_limits_stations() {
        let mut board = StationBoard::default();
        for id in 1..=MAX_STATIONS as u32 {
            assert_eq!(board.apply(&payload(id)), BoardUpdate::Added);
        }
        assert_eq!(board.apply(&payload(99)), BoardUpdate::Rejected);
        let mut newer = payload(1);
        newer.received_at = Some(1466000060000);
        assert_eq!(board.apply(&newer), BoardUpdate::Updated);

        assert_eq!(board.len(), MAX_STATIONS);
        assert!(board.get(99).is_none());
        assert_eq!(board.get(1).unwrap().updates, 2);
        assert_eq!(board.ids()[0], 1);
    }

    #[test]
    fn test_new_station_shows_sprout() {
        let view = StationView::new(4);
        assert_eq!(view.growth, Some(GrowthStage::Sprout));

        let mut view = StationView::new(4);
        let mut idle = payload(4);
        idle.obtainable_productivity = 0.0;
        view.apply(&idle);
        assert_eq!(view.growth, Some(GrowthStage::Sprout));
    }

    #[test]
    fn test_replayed_payload_adds_no_chart_point() {
        let mut board = StationBoard::default();
        let data = payload(2);

        assert_eq!(board.apply(&data), BoardUpdate::Added);
        assert_eq!(board.apply(&data), BoardUpdate::Replayed);

        let view = board.get(2).unwrap();
        assert_eq!(view.chart.len(), 1);
        assert_eq!(view.updates, 1);

        let mut next = payload(2);
        next.received_at = Some(1466000060000);
        assert_eq!(board.apply(&next), BoardUpdate::Updated);
        let view = board.get(2).unwrap();
        assert_eq!(view.chart.x_bounds(), Some((1, 2)));
        assert_eq!(view.updates, 2);
    }
}
