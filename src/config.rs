//! Configuration management for climate-board.
//!
//! This module handles loading and validating configuration from files.
//! It supports YAML, JSON, and TOML formats. Command line overrides are
//! applied on top by the binary.

use chrono::format::{Item, StrftimeItems};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::query::Quantity;

// Default configuration constants
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/metrics";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_TICK_MILLIS: u64 = 1000;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SENSOR_LABEL: &str = "sensorId";
pub const DEFAULT_UNKNOWN_PLACEHOLDER: &str = "unbekannt";
pub const DEFAULT_CLOCK_FORMAT: &str = "%H:%M:%S";
pub const MAX_PRECISION: usize = 6;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

const DEFAULT_ROOMS: &[(&str, &str)] = &[
    ("Wohnzimmer", "5"),
    ("Außen", "0"),
    ("Büro", "4"),
    ("Vorratsraum", "3"),
    ("Schlafzimmer", "2"),
];

static DEFAULT_QUANTITIES: Lazy<Vec<Quantity>> = Lazy::new(|| {
    vec![
        Quantity::temperature(),
        Quantity::relative_humidity(),
        Quantity::absolute_humidity(),
    ]
});

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// A displayed room and the sensor feeding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    #[serde(alias = "sensor-id")]
    pub sensor_id: String,
}

impl Room {
    pub fn new(name: &str, sensor_id: &str) -> Self {
        Self {
            name: name.to_string(),
            sensor_id: sensor_id.to_string(),
        }
    }
}

pub fn default_rooms() -> Vec<Room> {
    DEFAULT_ROOMS
        .iter()
        .map(|(name, id)| Room::new(name, id))
        .collect()
}

pub fn default_quantities() -> Vec<Quantity> {
    DEFAULT_QUANTITIES.clone()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid endpoint '{0}', expected an http:// or https:// URL")]
    InvalidEndpoint(String),

    #[error("refresh_interval_secs must be at least {min}, got {got}")]
    RefreshIntervalTooShort { min: u64, got: u64 },

    #[error("tick_millis must be greater than 0")]
    ZeroTick,

    #[error("At least one room must be configured")]
    NoRooms,

    #[error("At least one quantity must be configured")]
    NoQuantities,

    #[error("Room #{0} has an empty name or sensor_id")]
    IncompleteRoom(usize),

    #[error("Quantity '{0}' has an empty metric name")]
    IncompleteQuantity(String),

    #[error("Quantity '{label}' has precision {precision}, maximum is {max}")]
    PrecisionTooLarge {
        label: String,
        precision: usize,
        max: usize,
    },

    #[error("sensor_label must not be empty")]
    EmptySensorLabel,

    #[error("Invalid clock_format '{0}'")]
    InvalidClockFormat(String),

    #[error("Invalid log_level '{0}', expected one of off, error, warn, info, debug, trace")]
    InvalidLogLevel(String),
}

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Source
    pub endpoint: Option<String>,
    /// Read exposition text from this file instead of the endpoint
    #[serde(alias = "source-file")]
    pub source_file: Option<PathBuf>,
    #[serde(alias = "fetch-timeout-secs")]
    pub fetch_timeout_secs: Option<u64>,

    // Cadence
    #[serde(alias = "refresh-interval-secs")]
    pub refresh_interval_secs: Option<u64>,
    #[serde(alias = "tick-millis")]
    pub tick_millis: Option<u64>,

    // Display
    #[serde(alias = "sensor-label")]
    pub sensor_label: Option<String>,
    #[serde(alias = "unknown-placeholder")]
    pub unknown_placeholder: Option<String>,
    #[serde(alias = "clock-format")]
    pub clock_format: Option<String>,

    // Logging
    pub log_level: Option<String>,

    #[serde(default = "default_rooms")]
    pub rooms: Vec<Room>,

    #[serde(default = "default_quantities")]
    pub quantities: Vec<Quantity>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            source_file: None,
            fetch_timeout_secs: Some(DEFAULT_FETCH_TIMEOUT_SECS),
            refresh_interval_secs: Some(DEFAULT_REFRESH_INTERVAL_SECS),
            tick_millis: Some(DEFAULT_TICK_MILLIS),
            sensor_label: Some(DEFAULT_SENSOR_LABEL.to_string()),
            unknown_placeholder: Some(DEFAULT_UNKNOWN_PLACEHOLDER.to_string()),
            clock_format: Some(DEFAULT_CLOCK_FORMAT.to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            rooms: default_rooms(),
            quantities: default_quantities(),
        }
    }
}

impl Config {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
        )
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.unwrap_or(DEFAULT_TICK_MILLIS))
    }

    /// `None` when the timeout is disabled with 0.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn sensor_label(&self) -> &str {
        self.sensor_label.as_deref().unwrap_or(DEFAULT_SENSOR_LABEL)
    }

    pub fn unknown_placeholder(&self) -> &str {
        self.unknown_placeholder
            .as_deref()
            .unwrap_or(DEFAULT_UNKNOWN_PLACEHOLDER)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn clock_format(&self) -> &str {
        self.clock_format.as_deref().unwrap_or(DEFAULT_CLOCK_FORMAT)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.source_file.is_none() {
        let endpoint = cfg.endpoint();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
    }

    let interval = cfg.refresh_interval().as_secs();
    if interval < MIN_REFRESH_INTERVAL_SECS {
        return Err(ConfigError::RefreshIntervalTooShort {
            min: MIN_REFRESH_INTERVAL_SECS,
            got: interval,
        });
    }

    if cfg.tick().is_zero() {
        return Err(ConfigError::ZeroTick);
    }

    if !LOG_LEVELS.contains(&cfg.log_level()) {
        return Err(ConfigError::InvalidLogLevel(cfg.log_level().to_string()));
    }

    if StrftimeItems::new(cfg.clock_format()).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidClockFormat(cfg.clock_format().to_string()));
    }

    if cfg.sensor_label().is_empty() {
        return Err(ConfigError::EmptySensorLabel);
    }

    if cfg.rooms.is_empty() {
        return Err(ConfigError::NoRooms);
    }
    if let Some(idx) = cfg
        .rooms
        .iter()
        .position(|r| r.name.trim().is_empty() || r.sensor_id.is_empty())
    {
        return Err(ConfigError::IncompleteRoom(idx + 1));
    }

    if cfg.quantities.is_empty() {
        return Err(ConfigError::NoQuantities);
    }
    for q in &cfg.quantities {
        if q.metric.is_empty() {
            return Err(ConfigError::IncompleteQuantity(q.label.clone()));
        }
        if q.precision > MAX_PRECISION {
            return Err(ConfigError::PrecisionTooLarge {
                label: q.label.clone(),
                precision: q.precision,
                max: MAX_PRECISION,
            });
        }
    }

    Ok(())
}

/// Configuration loading with multiple format support.
///
/// Without an explicit path the default locations are tried in order and
/// the built-in defaults are used when none exists.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/climate-board/climate-board.yaml",
                "./climate-board.yaml",
                "./climate-board.yml",
                "./climate-board.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;

    let config = parse_config(&content, &path)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config text, picking the format from the file extension.
pub fn parse_config(content: &str, path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        // Default to YAML
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders configuration in requested format
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_effective_config(&Config::default()), Ok(()));
    }

    #[test]
    fn test_default_rooms() {
        let rooms = default_rooms();
        assert_eq!(rooms.len(), 5);
        assert_eq!(rooms[0], Room::new("Wohnzimmer", "5"));
        assert_eq!(rooms[1], Room::new("Außen", "0"));
    }

    #[test]
    fn test_refresh_interval_minimum() {
        let cfg = Config {
            refresh_interval_secs: Some(5),
            ..Config::default()
        };
        assert_eq!(
            validate_effective_config(&cfg),
            Err(ConfigError::RefreshIntervalTooShort { min: 10, got: 5 })
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let cfg = Config {
            endpoint: Some("localhost:3000".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::InvalidEndpoint(_))
        ));

        // A file source makes the endpoint irrelevant.
        let cfg = Config {
            source_file: Some(PathBuf::from("metrics.txt")),
            ..cfg
        };
        assert_eq!(validate_effective_config(&cfg), Ok(()));
    }

    #[test]
    fn test_rooms_and_quantities_required() {
        let cfg = Config {
            rooms: vec![],
            ..Config::default()
        };
        assert_eq!(validate_effective_config(&cfg), Err(ConfigError::NoRooms));

        let cfg = Config {
            rooms: vec![Room::new("Keller", "")],
            ..Config::default()
        };
        assert_eq!(
            validate_effective_config(&cfg),
            Err(ConfigError::IncompleteRoom(1))
        );

        let cfg = Config {
            quantities: vec![],
            ..Config::default()
        };
        assert_eq!(
            validate_effective_config(&cfg),
            Err(ConfigError::NoQuantities)
        );
    }

    #[test]
    fn test_invalid_log_level() {
        let cfg = Config {
            log_level: Some("verbose".into()),
            ..Config::default()
        };
        assert_eq!(
            validate_effective_config(&cfg),
            Err(ConfigError::InvalidLogLevel("verbose".into()))
        );
    }

    #[test]
    fn test_invalid_clock_format() {
        let cfg = Config {
            clock_format: Some("%H:%Q".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::InvalidClockFormat(_))
        ));
    }

    #[test]
    fn test_precision_limit() {
        let mut q = Quantity::temperature();
        q.precision = 9;
        let cfg = Config {
            quantities: vec![q],
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&cfg),
            Err(ConfigError::PrecisionTooLarge { precision: 9, .. })
        ));
    }

    #[test]
    fn test_load_yaml_with_partial_fields() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "endpoint: http://maurice:3000/metrics\nrefresh_interval_secs: 30\nrooms:\n  - name: Keller\n    sensor_id: \"7\"\n"
        )
        .expect("write");

        let cfg = load_config(Some(file.path())).expect("load");
        assert_eq!(cfg.endpoint(), "http://maurice:3000/metrics");
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(30));
        assert_eq!(cfg.rooms, vec![Room::new("Keller", "7")]);
        assert_eq!(cfg.quantities, default_quantities());
        assert_eq!(cfg.unknown_placeholder(), DEFAULT_UNKNOWN_PLACEHOLDER);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("tempfile");
        write!(file, r#"{{"unknown_placeholder": "unknown", "tick_millis": 500}}"#).expect("write");

        let cfg = load_config(Some(file.path())).expect("load");
        assert_eq!(cfg.unknown_placeholder(), "unknown");
        assert_eq!(cfg.tick(), Duration::from_millis(500));
        assert_eq!(cfg.rooms.len(), 5);
    }

    #[test]
    fn test_render_roundtrips_through_yaml() {
        let text = render_config(&Config::default(), ConfigFormat::Yaml).expect("render");
        let cfg = parse_config(&text, Path::new("x.yaml")).expect("parse");
        assert_eq!(cfg.rooms, default_rooms());
        assert_eq!(cfg.quantities, default_quantities());
    }

    #[test]
    fn test_fetch_timeout_zero_disables() {
        let cfg = Config {
            fetch_timeout_secs: Some(0),
            ..Config::default()
        };
        assert_eq!(cfg.fetch_timeout(), None);
        assert_eq!(
            Config::default().fetch_timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
