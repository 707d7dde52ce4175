//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use climate_board::config::{render_config, Config, ConfigFormat};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(match format {
            ConfigFormat::Json => "climate-board.json",
            ConfigFormat::Toml => "climate-board.toml",
            ConfigFormat::Yaml => "climate-board.yaml",
        }),
    };

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# climate-board Configuration
# ===========================
#
# Source
# ------
# endpoint: "http://localhost:3000/metrics"  # Metrics endpoint (Prometheus text format)
# source_file: null            # Read this file instead of the endpoint
# fetch_timeout_secs: 30       # Request timeout, 0 = none
#
# Cadence
# -------
# refresh_interval_secs: 10    # Seconds between successful refreshes (>= 10)
# tick_millis: 1000            # Clock redraw / refresh check cadence
#
# Display
# -------
# sensor_label: "sensorId"     # Label holding the sensor identifier
# unknown_placeholder: "unbekannt"  # Shown when a sensor has no sample
# clock_format: "%H:%M:%S"     # chrono strftime format for the clock
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace (logs go to stderr)
#
# Rooms
# -----
# rooms:                       # One block per room, looked up by sensor_id
#   - name: Wohnzimmer
#     sensor_id: "5"
#
# Quantities
# ----------
# quantities:                  # precision = decimal places
#   - label: Temperatur
#     metric: air_temperature
#     precision: 1
#     unit: "°C"
"#;

    format!("{comments}\n{yaml}")
}
