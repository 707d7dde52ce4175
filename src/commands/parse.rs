//! Parse command implementation.
//!
//! Dumps the grouped samples of an exposition text, sorted by metric name.

use std::path::Path;

use climate_board::config::ConfigFormat;
use climate_board::exposition::parse;

use super::read_input;

/// Parses a file (or stdin) and prints the metric set.
pub fn command_parse(
    file: Option<&Path>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(file)?;
    let metrics = parse(&text);
    let sorted = metrics.to_sorted();

    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&sorted)?,
        ConfigFormat::Toml => toml::to_string_pretty(&sorted)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&sorted)?,
    };

    println!("{output}");
    eprintln!(
        "📊 {} samples across {} metrics",
        metrics.sample_count(),
        metrics.len()
    );
    Ok(())
}
