//! climate-board library
//!
//! Reads a Prometheus text exposition endpoint and turns it into per-room
//! temperature and humidity readings. The library holds everything except
//! the command line front end, so the pieces can be reused and tested on
//! their own.
//!
//! # Usage
//!
//! ```rust
//! use climate_board::exposition::parse;
//! use climate_board::query::{lookup, Quantity};
//!
//! let text = "# HELP air_temperature desc\n\
//!             air_temperature{sensorId=\"5\"} 21.37\n\
//!             humidity_relative{sensorId=\"5\"} 45\n";
//! let metrics = parse(text);
//!
//! let sample = lookup(&metrics, "air_temperature", "sensorId", "5").unwrap();
//! assert_eq!(sample.value_text, "21.37");
//!
//! let temp = Quantity::temperature().display(&metrics, "sensorId", "5", "unbekannt");
//! assert_eq!(temp, "21.4 °C");
//! ```
//!
//! # Modules
//!
//! - [`exposition`]: best-effort parser for the text format
//! - [`query`]: last-match lookup and fixed-precision formatting
//! - [`dashboard`]: state value and its update function
//! - [`source`]: HTTP and file sources of exposition text
//! - [`poller`]: clock and refresh background tasks
//! - [`render`]: text and JSON frames
//! - [`config`]: configuration loading and validation

pub mod config;
pub mod dashboard;
pub mod exposition;
pub mod poller;
pub mod query;
pub mod render;
pub mod source;

// Re-export main types for convenience
pub use config::{Config, Room};
pub use dashboard::{DashboardState, Event, StateStore};
pub use exposition::{parse, MetricSet, Sample};
pub use query::{format_reading, lookup, Quantity};
pub use source::{MetricsSource, SourceError};
