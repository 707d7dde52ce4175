//! Once command implementation.
//!
//! Fetches a single snapshot, prints one frame and exits.

use chrono::Local;
use std::sync::Arc;
use std::time::Instant;

use climate_board::config::Config;
use climate_board::dashboard::{update, DashboardState, Event};
use climate_board::poller::fetch_metrics;
use climate_board::render::{build_view, render, OutputFormat};
use climate_board::source::MetricsSource;

/// Fetches once and prints the resulting frame.
///
/// A failed fetch is reported and returned as an error after the frame with
/// placeholders has been printed.
pub async fn command_once(
    config: &Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = MetricsSource::from_config(config)?;
    let state = DashboardState::new(Local::now());

    let (state, failure) = match fetch_metrics(&source).await {
        Ok(metrics) => (
            update(
                &state,
                Event::RefreshSucceeded {
                    metrics: Arc::new(metrics),
                    at: Instant::now(),
                    wall: Local::now(),
                },
            ),
            None,
        ),
        Err(e) => {
            let error = format!("{e:#}");
            (
                update(&state, Event::RefreshFailed {
                    error: error.clone(),
                }),
                Some(error),
            )
        }
    };

    println!("{}", render(&build_view(&state, config), format)?);

    match failure {
        Some(error) => Err(format!("Fetching {} failed: {}", source.describe(), error).into()),
        None => Ok(()),
    }
}
