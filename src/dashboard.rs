//! Dashboard state and its update function.
//!
//! The state is a plain value. Both background tasks describe what happened
//! as an [`Event`], and [`update`] derives the next state from the current one.
//! Nothing mutates fields in place, which keeps the transitions testable
//! without a runtime.

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use crate::exposition::MetricSet;

/// Snapshot of everything the screen shows.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Wall clock value shown at the top.
    pub now: DateTime<Local>,
    /// Metrics from the last successful refresh.
    pub metrics: Option<Arc<MetricSet>>,
    /// Monotonic time of the last successful refresh.
    pub last_refresh: Option<Instant>,
    /// Wall clock time of the last successful refresh, for display.
    pub last_refresh_at: Option<DateTime<Local>>,
    pub refresh_in_progress: bool,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl DashboardState {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now,
            metrics: None,
            last_refresh: None,
            last_refresh_at: None,
            refresh_in_progress: false,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    /// True until the first successful refresh.
    pub fn is_stale(&self) -> bool {
        self.metrics.is_none()
    }
}

/// Something that happened to the dashboard.
#[derive(Debug, Clone)]
pub enum Event {
    ClockTicked(DateTime<Local>),
    RefreshStarted,
    RefreshSucceeded {
        metrics: Arc<MetricSet>,
        at: Instant,
        wall: DateTime<Local>,
    },
    RefreshFailed {
        error: String,
    },
}

/// Derives the next state.
pub fn update(state: &DashboardState, event: Event) -> DashboardState {
    match event {
        Event::ClockTicked(now) => DashboardState {
            now,
            ..state.clone()
        },
        Event::RefreshStarted => DashboardState {
            refresh_in_progress: true,
            ..state.clone()
        },
        Event::RefreshSucceeded { metrics, at, wall } => DashboardState {
            metrics: Some(metrics),
            last_refresh: Some(at),
            last_refresh_at: Some(wall),
            refresh_in_progress: false,
            consecutive_failures: 0,
            last_error: None,
            ..state.clone()
        },
        Event::RefreshFailed { error } => DashboardState {
            refresh_in_progress: false,
            consecutive_failures: state.consecutive_failures.saturating_add(1),
            last_error: Some(error),
            ..state.clone()
        },
    }
}

/// Whether a refresh should start at `now`.
///
/// Never while one is in flight; otherwise when nothing was fetched yet or
/// at least `interval` passed since the last successful refresh.
pub fn refresh_due(state: &DashboardState, now: Instant, interval: Duration) -> bool {
    if state.refresh_in_progress {
        return false;
    }
    match state.last_refresh {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= interval,
    }
}

/// Shared holder of the current state, replaced wholesale on every event.
#[derive(Debug)]
pub struct StateStore {
    inner: RwLock<DashboardState>,
}

impl StateStore {
    pub fn new(initial: DashboardState) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Applies `event` and returns the resulting state.
    pub async fn apply(&self, event: Event) -> DashboardState {
        let mut guard = self.inner.write().await;
        let next = update(&guard, event);
        *guard = next.clone();
        next
    }

    /// Marks a refresh as started if one is due. Returns false when skipped.
    pub async fn try_begin_refresh(&self, now: Instant, interval: Duration) -> bool {
        let mut guard = self.inner.write().await;
        if !refresh_due(&guard, now, interval) {
            if guard.refresh_in_progress {
                debug!("Refresh already in progress, skipping");
            }
            return false;
        }
        *guard = update(&guard, Event::RefreshStarted);
        true
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.inner.read().await.clone()
    }
}
