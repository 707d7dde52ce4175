//! Turns dashboard state into something to show.
//!
//! [`build_view`] does all lookups and formatting; the text and JSON
//! renderers only lay the finished strings out.

use serde::Serialize;
use std::fmt::Write as FmtWrite;

use crate::config::Config;
use crate::dashboard::DashboardState;
use crate::exposition::MetricSet;

/// ANSI sequence that clears the terminal and moves the cursor home.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    pub name: String,
    pub sensor_id: String,
    pub readings: Vec<Reading>,
}

/// Finished, formatted content of one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub clock: String,
    pub last_refresh: Option<String>,
    /// No successful refresh yet.
    pub stale: bool,
    pub rooms: Vec<RoomView>,
}

/// Output format options for rendered frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Formats every configured quantity for every room.
pub fn build_view(state: &DashboardState, config: &Config) -> DashboardView {
    let empty = MetricSet::new();
    let metrics = state.metrics.as_deref().unwrap_or(&empty);
    let clock_format = config.clock_format();

    let rooms = config
        .rooms
        .iter()
        .map(|room| RoomView {
            name: room.name.clone(),
            sensor_id: room.sensor_id.clone(),
            readings: config
                .quantities
                .iter()
                .map(|q| Reading {
                    label: q.label.clone(),
                    text: q.display(
                        metrics,
                        config.sensor_label(),
                        &room.sensor_id,
                        config.unknown_placeholder(),
                    ),
                })
                .collect(),
        })
        .collect();

    DashboardView {
        clock: state.now.format(clock_format).to_string(),
        last_refresh: state
            .last_refresh_at
            .map(|t| t.format(clock_format).to_string()),
        stale: state.is_stale(),
        rooms,
    }
}

/// Plain text frame.
pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", view.clock);
    match &view.last_refresh {
        Some(at) => {
            let _ = writeln!(out, "Stand: {}", at);
        }
        None => {
            let _ = writeln!(out, "Stand: -");
        }
    }

    let width = view
        .rooms
        .iter()
        .flat_map(|r| r.readings.iter().map(|q| q.label.chars().count()))
        .max()
        .unwrap_or(0);

    for room in &view.rooms {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", room.name);
        for reading in &room.readings {
            let _ = writeln!(out, "  {:<width$}  {}", reading.label, reading.text);
        }
    }

    out
}

/// JSON frame.
pub fn render_json(view: &DashboardView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}

pub fn render(view: &DashboardView, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(view)),
        OutputFormat::Json => render_json(view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Room;
    use crate::dashboard::{update, Event};
    use crate::exposition::parse;
    use crate::query::Quantity;
    use chrono::{Local, TimeZone};
    use std::sync::Arc;
    use std::time::Instant;

    fn config() -> Config {
        Config {
            rooms: vec![Room::new("Wohnzimmer", "5"), Room::new("Außen", "0")],
            quantities: vec![Quantity::temperature(), Quantity::relative_humidity()],
            ..Config::default()
        }
    }

    fn state_with(text: &str) -> DashboardState {
        let now = Local
            .with_ymd_and_hms(2024, 1, 15, 7, 5, 9)
            .single()
            .expect("valid time");
        update(
            &DashboardState::new(now),
            Event::RefreshSucceeded {
                metrics: Arc::new(parse(text)),
                at: Instant::now(),
                wall: now,
            },
        )
    }

    #[test]
    fn test_view_formats_each_room() {
        let state = state_with(
            "air_temperature{sensorId=\"5\"} 21.37\nhumidity_relative{sensorId=\"5\"} 45\n",
        );
        let view = build_view(&state, &config());

        assert_eq!(view.clock, "07:05:09");
        assert!(!view.stale);
        assert_eq!(view.rooms[0].readings[0].text, "21.4 °C");
        assert_eq!(view.rooms[0].readings[1].text, "45 %");
        assert_eq!(view.rooms[1].readings[0].text, "unbekannt");
        assert_eq!(view.rooms[1].readings[1].text, "unbekannt");
    }

    #[test]
    fn test_stale_view_uses_placeholder() {
        let state = DashboardState::new(Local::now());
        let view = build_view(&state, &config());

        assert!(view.stale);
        assert_eq!(view.last_refresh, None);
        assert!(view
            .rooms
            .iter()
            .flat_map(|r| &r.readings)
            .all(|r| r.text == "unbekannt"));
    }

    #[test]
    fn test_render_text_layout() {
        let state = state_with("air_temperature{sensorId=\"0\"} -3.26\n");
        let text = render_text(&build_view(&state, &config()));

        assert!(text.starts_with("07:05:09\nStand: 07:05:09\n"));
        assert!(text.contains("\nAußen\n"));
        assert!(text.contains("Temperatur    -3.3 °C"));
    }

    #[test]
    fn test_render_json() {
        let state = state_with("humidity_relative{sensorId=\"5\"} 44.5\n");
        let json = render_json(&build_view(&state, &config())).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");

        assert_eq!(value["rooms"][0]["readings"][1]["text"], "45 %");
        assert_eq!(value["stale"], false);
    }
}
