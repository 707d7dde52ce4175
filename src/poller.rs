//! Background tasks driving the live dashboard.
//!
//! Two independent tasks share one [`StateStore`]:
//! - the clock task ticks unconditionally, moves the clock and redraws;
//! - the refresh task ticks at the same cadence but only fetches when
//!   [`refresh_due`](crate::dashboard::refresh_due) says so.

use anyhow::Context;
use chrono::Local;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::dashboard::{Event, StateStore};
use crate::exposition::{parse, MetricSet};
use crate::render::{build_view, render, OutputFormat, CLEAR_SCREEN};
use crate::source::MetricsSource;

/// Fetches and parses one snapshot.
#[instrument(skip_all)]
pub async fn fetch_metrics(source: &MetricsSource) -> anyhow::Result<MetricSet> {
    let text = source
        .fetch()
        .await
        .context("fetching exposition text failed")?;
    let metrics = parse(&text);
    debug!(
        "Parsed {} samples across {} metrics",
        metrics.sample_count(),
        metrics.len()
    );
    Ok(metrics)
}

/// Runs one refresh cycle against the store if one is due.
///
/// Returns `Ok(false)` when the refresh was skipped. Failures are applied as
/// [`Event::RefreshFailed`] and then returned, leaving the previous snapshot
/// in place.
pub async fn refresh_once(
    store: &StateStore,
    source: &MetricsSource,
    interval: Duration,
) -> anyhow::Result<bool> {
    if !store.try_begin_refresh(Instant::now(), interval).await {
        return Ok(false);
    }

    let start = Instant::now();
    match fetch_metrics(source).await {
        Ok(metrics) => {
            let samples = metrics.sample_count();
            store
                .apply(Event::RefreshSucceeded {
                    metrics: Arc::new(metrics),
                    at: Instant::now(),
                    wall: Local::now(),
                })
                .await;
            info!(
                "Refresh completed: {} samples in {:.1}ms",
                samples,
                start.elapsed().as_secs_f64() * 1000.0
            );
            Ok(true)
        }
        Err(e) => {
            let state = store
                .apply(Event::RefreshFailed {
                    error: format!("{e:#}"),
                })
                .await;
            error!(
                "Refresh failed ({} in a row): {:#}",
                state.consecutive_failures, e
            );
            Err(e)
        }
    }
}

/// Refresh task: checks eligibility every tick until shutdown.
pub async fn run_refresh_task(
    store: Arc<StateStore>,
    source: MetricsSource,
    tick: Duration,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Refresh task started for {} every {:?}",
        source.describe(),
        interval
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Errors are already logged and recorded in the state.
                let _ = refresh_once(&store, &source, interval).await;
            }
            _ = shutdown.changed() => {
                debug!("Refresh task stopping");
                return;
            }
        }
    }
}

/// Clock task: moves the clock and redraws every tick until shutdown.
pub async fn run_clock_task(
    store: Arc<StateStore>,
    config: Arc<Config>,
    format: OutputFormat,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = store.apply(Event::ClockTicked(Local::now())).await;
                let view = build_view(&state, &config);
                match render(&view, format) {
                    Ok(frame) => draw(&frame, format),
                    Err(e) => warn!("Failed to render frame: {}", e),
                }
            }
            _ = shutdown.changed() => {
                debug!("Clock task stopping");
                return;
            }
        }
    }
}

fn draw(frame: &str, format: OutputFormat) {
    let mut stdout = std::io::stdout().lock();
    let result = match format {
        OutputFormat::Text => write!(stdout, "{CLEAR_SCREEN}{frame}"),
        OutputFormat::Json => writeln!(stdout, "{frame}"),
    };
    if let Err(e) = result.and_then(|_| stdout.flush()) {
        warn!("Failed to write frame: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardState;

    fn store() -> StateStore {
        StateStore::new(DashboardState::new(Local::now()))
    }

    #[tokio::test]
    async fn test_refresh_once_success() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "air_temperature{{sensorId=\"5\"}} 21.37").expect("write");

        let store = store();
        let source = MetricsSource::file(file.path());
        let refreshed = refresh_once(&store, &source, Duration::from_secs(10))
            .await
            .expect("refresh");

        assert!(refreshed);
        let state = store.snapshot().await;
        assert!(state.last_refresh.is_some());
        assert!(!state.refresh_in_progress);
    }

    #[tokio::test]
    async fn test_refresh_once_skips_when_not_due() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "a 1").expect("write");

        let store = store();
        let source = MetricsSource::file(file.path());
        let interval = Duration::from_secs(3600);

        assert!(refresh_once(&store, &source, interval).await.expect("first"));
        assert!(!refresh_once(&store, &source, interval).await.expect("second"));
    }

    #[tokio::test]
    async fn test_refresh_task_stops_on_shutdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(store());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run_refresh_task(
            store.clone(),
            MetricsSource::file(dir.path().join("missing")),
            Duration::from_millis(10),
            Duration::from_secs(10),
            rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).expect("send");
        handle.await.expect("join");

        let state = store.snapshot().await;
        assert!(state.metrics.is_none());
        assert!(state.consecutive_failures >= 1);
    }
}
