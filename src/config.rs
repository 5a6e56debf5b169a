//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::agro::CropParameters;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub mqtt: MqttConfig,

    #[serde(default)]
    pub crop: CropParameters,

    #[serde(default)]
    pub stations: StationsConfig,

    #[serde(default)]
    pub alerts: AlertsConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent dashboard connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Directory of the built dashboard, served at `/`
    #[serde(default)]
    pub ui_dir: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            max_connections: default_max_connections(),
            ui_dir: None,
        }
    }
}

impl ApiConfig {
    /// Socket address to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// MQTT broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_enabled")]
    pub enabled: bool,

    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Base topic; stations publish on it or on `<topic>/<id>`
    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default)]
    pub qos: u8,

    #[serde(default = "default_mqtt_username")]
    pub username: String,

    #[serde(default = "default_mqtt_password")]
    pub password: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

fn default_mqtt_enabled() -> bool {
    true
}

fn default_mqtt_host() -> String {
    "0.0.0.0".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_keep_alive() -> u64 {
    60
}

fn default_topic() -> String {
    "weather_data".to_string()
}

fn default_mqtt_username() -> String {
    "server_listener".to_string()
}

fn default_mqtt_password() -> String {
    "l4b804".to_string()
}

fn default_client_id() -> String {
    "labmet-server".to_string()
}

fn default_reconnect_delay() -> u64 {
    5
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enabled: default_mqtt_enabled(),
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            keep_alive_secs: default_keep_alive(),
            topic: default_topic(),
            qos: 0,
            username: default_mqtt_username(),
            password: default_mqtt_password(),
            client_id: default_client_id(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

/// Station bookkeeping
#[derive(Debug, Clone, Deserialize)]
pub struct StationsConfig {
    /// Id given to readings that carry none
    #[serde(default = "default_station_id")]
    pub default_id: u32,

    /// Readings kept per station
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_station_id() -> u32 {
    1
}

fn default_history_capacity() -> usize {
    crate::station::DEFAULT_HISTORY_CAPACITY
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            default_id: default_station_id(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Dry soil alert configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    #[serde(default = "default_alerts_enabled")]
    pub enabled: bool,

    /// Soil moisture below which the alert fires
    #[serde(default = "default_dry_soil_threshold")]
    pub dry_soil_threshold: f64,

    /// Minimum time between two alerts of the same station
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

fn default_alerts_enabled() -> bool {
    true
}

fn default_dry_soil_threshold() -> f64 {
    10.0
}

fn default_cooldown() -> u64 {
    3600
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: default_alerts_enabled(),
            dry_soil_threshold: default_dry_soil_threshold(),
            cooldown_secs: default_cooldown(),
        }
    }
}

/// Push notification service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Bearer API key; notifications are off without one
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_notification_url")]
    pub base_url: String,

    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default = "default_notification_timeout")]
    pub request_timeout_ms: u64,
}

fn default_notification_url() -> String {
    "https://api.ionic.io".to_string()
}

fn default_profile() -> String {
    "labmet".to_string()
}

fn default_notification_timeout() -> u64 {
    5000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_notification_url(),
            profile: default_profile(),
            request_timeout_ms: default_notification_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("labmet").join("config.toml")),
            Some(PathBuf::from("/etc/labmet/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(host) = var("LABMET_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("LABMET_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Some(dir) = var("LABMET_UI_DIR") {
            self.api.ui_dir = Some(dir);
        }

        // MQTT overrides
        if let Some(host) = var("LABMET_MQTT_HOST") {
            self.mqtt.host = host;
        }
        if let Some(port) = var("LABMET_MQTT_PORT").and_then(|p| p.parse().ok()) {
            self.mqtt.port = port;
        }
        if let Some(topic) = var("LABMET_MQTT_TOPIC") {
            self.mqtt.topic = topic;
        }
        if let Some(username) = var("MQTT_SERVER_USERNAME") {
            self.mqtt.username = username;
        }
        if let Some(password) = var("MQTT_PASSWORD") {
            self.mqtt.password = password;
        }

        // Notification overrides
        if let Some(key) = var("NOTIFICATIONKEY") {
            self.notification.api_key = Some(key);
        }

        // Logging overrides
        if let Some(level) = var("LABMET_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LABMET_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# LabMet Configuration
#
# Environment variables override these settings:
# - LABMET_API_HOST, LABMET_API_PORT, LABMET_UI_DIR
# - LABMET_MQTT_HOST, LABMET_MQTT_PORT, LABMET_MQTT_TOPIC
# - MQTT_SERVER_USERNAME, MQTT_PASSWORD
# - NOTIFICATIONKEY
# - LABMET_LOG_LEVEL, LABMET_LOG_FORMAT

[api]
host = "0.0.0.0"
port = 5000

# Allowed CORS origins (empty allows any)
cors_origins = []

request_timeout_secs = 30

# Maximum concurrent dashboard connections
max_connections = 1000

# Built dashboard to serve at /
# ui_dir = "./labmet-ui/dist"

[mqtt]
enabled = true
host = "0.0.0.0"
port = 1883
keep_alive_secs = 60

# Stations publish on the topic itself or on "<topic>/<station id>"
topic = "weather_data"
qos = 0
username = "server_listener"
password = "l4b804"
client_id = "labmet-server"

# Delay before reconnecting after a broker error
reconnect_delay_secs = 5

[crop]
# Culture from the harvest table
culture = "potato"

# Yield response factor
ky = 1.1

# Site latitude (degrees, south negative)
latitude = 51.5044968

# Crop coefficient
kc = 0.8

# Mean annual temperature (°C)
annual_temperature = 19.0

# Crop cycle length (days)
cycle_days = 130

peak_leaf_area_index = 3.0

# Available water content (mm)
awc = 35.0

# c3_winter, c3_summer or c4
temperature_fix = "c3_winter"

# kg_per_hectare or kg_per_square_meter
unit = "kg_per_hectare"

[stations]
# Id for readings that carry none
default_id = 1

# Readings kept in memory per station
history_capacity = 100

[alerts]
enabled = true
dry_soil_threshold = 10.0
cooldown_secs = 3600

[notification]
# Push service API key; notifications are off without one
# api_key = ""
base_url = "https://api.ionic.io"
profile = "labmet"
request_timeout_ms = 5000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
