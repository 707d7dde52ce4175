//! CLI arguments and subcommands for climate-board.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands, and merges the flags into
//! the file configuration.

use clap::{Parser, Subcommand, ValueEnum};
use climate_board::config::{load_config, Config, ConfigFormat};
use climate_board::render::OutputFormat;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "climate-board",
    about = "Terminal dashboard for room temperature and humidity",
    long_about = "Terminal dashboard for room temperature and humidity.\n\n\
                  Polls a Prometheus text exposition endpoint, picks the readings of \
                  each configured room by its sensor label and shows them next to a \
                  wall clock.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Metrics endpoint URL
    #[arg(short = 'e', long)]
    pub endpoint: Option<String>,

    /// Read exposition text from a file instead of the endpoint
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// Seconds between successful refreshes (minimum 10)
    #[arg(long)]
    pub refresh_interval: Option<u64>,

    /// Clock and scheduling tick in milliseconds
    #[arg(long)]
    pub tick_millis: Option<u64>,

    /// Fetch timeout in seconds (0 = no timeout)
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Frame format for the dashboard and `once`
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch once, print one frame and exit
    Once,

    /// Parse exposition text and dump the grouped samples
    Parse {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Look up the last sample of a metric matching one label
    Query {
        /// Metric name
        #[arg(short = 'm', long)]
        metric: String,

        /// Label name to filter on
        #[arg(short = 'l', long, default_value = "sensorId")]
        label: String,

        /// Label value to match
        #[arg(short = 'v', long)]
        value: String,

        /// Input file (configured source when omitted)
        file: Option<PathBuf>,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Validate configuration and try one fetch
    Check,
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(path) = &args.source_file {
        config.source_file = Some(path.clone());
    }
    if let Some(secs) = args.refresh_interval {
        config.refresh_interval_secs = Some(secs);
    }
    if let Some(millis) = args.tick_millis {
        config.tick_millis = Some(millis);
    }
    if let Some(secs) = args.fetch_timeout {
        config.fetch_timeout_secs = Some(secs);
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from([
            "climate-board",
            "--no-config",
            "--endpoint",
            "http://maurice:3000/metrics",
            "--refresh-interval",
            "60",
        ]);
        let config = resolve_config(&args).expect("resolve");

        assert_eq!(config.endpoint(), "http://maurice:3000/metrics");
        assert_eq!(config.refresh_interval_secs, Some(60));
        assert_eq!(config.tick_millis, Config::default().tick_millis);
    }

    #[test]
    fn test_query_subcommand() {
        let args = Args::parse_from([
            "climate-board",
            "query",
            "-m",
            "air_temperature",
            "-v",
            "5",
            "metrics.prom",
        ]);
        match args.command {
            Some(Commands::Query {
                metric,
                label,
                value,
                file,
            }) => {
                assert_eq!(metric, "air_temperature");
                assert_eq!(label, "sensorId");
                assert_eq!(value, "5");
                assert_eq!(file, Some(PathBuf::from("metrics.prom")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
