use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ChannelId;

/// A seismic event as returned by an event catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Catalog identifier
    pub id: String,
    /// The origin the catalog prefers, if any
    pub preferred_origin: Option<Origin>,
    /// The magnitude the catalog prefers, if any
    #[serde(default)]
    pub preferred_magnitude: Option<Magnitude>,
    /// Picks attached by analysts, never inspected by the cursors
    #[serde(default)]
    pub picks: Vec<Pick>,
}

/// Hypocenter and origin time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Depth below sea level in kilometers
    pub depth_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnitude {
    pub value: f64,
    /// Magnitude type, e.g. `Mw` or `ML`
    #[serde(default)]
    pub kind: Option<String>,
}

/// An arrival time picked on one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub channel: ChannelId,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub phase_hint: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl Event {
    /// Create an event with a preferred origin and nothing else
    pub fn new(id: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: id.into(),
            preferred_origin: Some(origin),
            preferred_magnitude: None,
            picks: Vec::new(),
        }
    }

    /// Origin time of the preferred origin
    pub fn origin_time(&self) -> Option<DateTime<Utc>> {
        self.preferred_origin.as_ref().map(|o| o.time)
    }

    /// Short human readable description: time, location, depth and magnitude
    pub fn describe(&self) -> String {
        let origin = match &self.preferred_origin {
            Some(o) => format!(
                "{} ({:.3}/{:.3}) {:.1}km",
                o.time.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                o.latitude,
                o.longitude,
                o.depth_km
            ),
            None => "Unknown quake".to_string(),
        };
        match &self.preferred_magnitude {
            Some(m) => format!("{} {} {}", origin, m.value, m.kind.as_deref().unwrap_or("")).trim_end().to_string(),
            None => origin,
        }
    }
}
