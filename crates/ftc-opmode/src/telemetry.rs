//! Driver-station telemetry.
//!
//! Op modes add caption/value pairs during a tick; [`Telemetry::update`]
//! closes the tick, returning the accumulated lines as a timestamped
//! [`TelemetryFrame`] and clearing the buffer for the next one.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One caption/value line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEntry {
    pub caption: String,
    pub value: String,
}

/// Everything published in one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub entries: Vec<TelemetryEntry>,
}

impl TelemetryFrame {
    /// Value of the first line with `caption`.
    pub fn get(&self, caption: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.caption == caption)
            .map(|e| e.value.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Per-tick telemetry buffer.
#[derive(Debug, Default)]
pub struct Telemetry {
    entries: Vec<TelemetryEntry>,
    sequence: u64,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_data(&mut self, caption: &str, value: impl Display) {
        self.entries.push(TelemetryEntry {
            caption: caption.to_string(),
            value: value.to_string(),
        });
    }

    /// A caption-only line.
    pub fn add_line(&mut self, line: &str) {
        self.add_data(line, "");
    }

    /// Drop everything added since the last update.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Publish the buffered lines and start a new frame.
    pub fn update(&mut self) -> TelemetryFrame {
        self.sequence += 1;
        TelemetryFrame {
            sequence: self.sequence,
            timestamp: Utc::now(),
            entries: std::mem::take(&mut self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_publishes_and_clears() {
        let mut t = Telemetry::new();
        t.add_data("Target RPM", 3000.0);
        t.add_data("Turtle", true);
        let frame = t.update();

        assert_eq!(frame.sequence, 1);
        assert_eq!(frame.get("Target RPM"), Some("3000"));
        assert_eq!(frame.get("Turtle"), Some("true"));
        assert_eq!(frame.get("Missing"), None);
        assert!(t.is_empty());

        let next = t.update();
        assert_eq!(next.sequence, 2);
        assert!(next.entries.is_empty());
    }

    #[test]
    fn frame_serializes_to_json() {
        let mut t = Telemetry::new();
        t.add_line("Initialized");
        let json = t.update().to_json().unwrap();
        let back: TelemetryFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries[0].caption, "Initialized");
        assert!(json.contains("\"timestamp\""));
    }
}
