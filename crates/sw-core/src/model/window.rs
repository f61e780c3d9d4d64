use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Absolute time window requested for one (event, station) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A predicted phase arrival, relative to the origin time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    /// Phase name, e.g. `P`
    pub phase: String,
    /// Seconds after origin time
    pub time: f64,
    /// Distance the arrival was computed for, in degrees
    pub distance_deg: f64,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time <= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Convert fractional seconds into a duration with microsecond resolution
pub fn duration_from_secs(value: f64) -> Duration {
    Duration::microseconds((value * 1_000_000.0).round() as i64)
}
