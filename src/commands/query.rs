//! Query command implementation.
//!
//! Looks up the last sample of one metric whose label matches a value.

use std::path::Path;

use climate_board::config::Config;
use climate_board::exposition::parse;
use climate_board::poller::fetch_metrics;
use climate_board::query::lookup;
use climate_board::source::MetricsSource;

use super::read_input;

/// Prints the matching sample, or exits with code 1 when nothing matches.
pub async fn command_query(
    metric: &str,
    label: &str,
    value: &str,
    file: Option<&Path>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = match file {
        Some(_) => parse(&read_input(file)?),
        None => fetch_metrics(&MetricsSource::from_config(config)?).await?,
    };

    match lookup(&metrics, metric, label, value) {
        Some(sample) => {
            println!("{}", serde_json::to_string_pretty(sample)?);
            Ok(())
        }
        None => {
            eprintln!("❌ No sample of '{}' with {}=\"{}\"", metric, label, value);
            std::process::exit(1);
        }
    }
}
