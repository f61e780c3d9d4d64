//! Query parameters for the event and station services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sw_core::{Channel, Event, Network, Station};

/// Event catalog query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub min_latitude: Option<f64>,
    pub max_latitude: Option<f64>,
    pub min_longitude: Option<f64>,
    pub max_longitude: Option<f64>,
    pub min_depth_km: Option<f64>,
    pub max_depth_km: Option<f64>,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    /// Sort order requested from the service, `time-asc` unless set
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}

/// Station metadata query; codes accept comma lists with `?` and `*` wildcards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationQuery {
    pub network: Option<String>,
    pub station: Option<String>,
    pub location: Option<String>,
    pub channel: Option<String>,
    pub min_latitude: Option<f64>,
    pub max_latitude: Option<f64>,
    pub min_longitude: Option<f64>,
    pub max_longitude: Option<f64>,
    /// Metadata detail level, `channel` unless set
    pub level: Option<String>,
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

fn check_range(name: &str, min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    for value in [min, max].into_iter().flatten() {
        if !value.is_finite() {
            return Err(format!("{} bound must be finite, got {}", name, value));
        }
    }
    match (min, max) {
        (Some(lo), Some(hi)) if lo > hi => Err(format!("min {} {} is greater than max {}", name, lo, hi)),
        _ => Ok(()),
    }
}

/// Match a code against a comma separated pattern list with `?` and `*` wildcards
///
/// `--` in the pattern list stands for the empty location code.
pub fn code_matches(patterns: &str, code: &str) -> bool {
    patterns.split(',').map(str::trim).any(|pattern| {
        let pattern = if pattern == "--" { "" } else { pattern };
        wildcard_match(pattern.as_bytes(), code.as_bytes())
    })
}

fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            wildcard_match(&pattern[1..], text) || (!text.is_empty() && wildcard_match(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => wildcard_match(&pattern[1..], &text[1..]),
        (Some(p), Some(t)) if p.eq_ignore_ascii_case(t) => wildcard_match(&pattern[1..], &text[1..]),
        _ => false,
    }
}

impl EventQuery {
    /// Fill in the defaults the services expect
    pub fn with_defaults(mut self) -> Self {
        self.order_by.get_or_insert_with(|| "time-asc".to_string());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start >= end {
                return Err(format!("event query start {} is not before end {}", start, end));
            }
        }
        check_range("latitude", self.min_latitude, self.max_latitude)?;
        check_range("longitude", self.min_longitude, self.max_longitude)?;
        check_range("depth", self.min_depth_km, self.max_depth_km)?;
        check_range("magnitude", self.min_magnitude, self.max_magnitude)?;
        if let Some(order) = &self.order_by {
            if !matches!(order.as_str(), "time" | "time-asc" | "magnitude" | "magnitude-asc") {
                return Err(format!("unknown event ordering '{}'", order));
            }
        }
        Ok(())
    }

    /// Whether an event satisfies every constraint of this query
    ///
    /// Events without a preferred origin only match queries that constrain
    /// neither time nor location.
    pub fn matches(&self, event: &Event) -> bool {
        let magnitude_ok = match &event.preferred_magnitude {
            Some(m) => within(m.value, self.min_magnitude, self.max_magnitude),
            None => self.min_magnitude.is_none() && self.max_magnitude.is_none(),
        };
        if !magnitude_ok {
            return false;
        }
        match &event.preferred_origin {
            Some(origin) => {
                self.start.map_or(true, |s| origin.time >= s)
                    && self.end.map_or(true, |e| origin.time <= e)
                    && within(origin.latitude, self.min_latitude, self.max_latitude)
                    && within(origin.longitude, self.min_longitude, self.max_longitude)
                    && within(origin.depth_km, self.min_depth_km, self.max_depth_km)
            }
            None => {
                self.start.is_none()
                    && self.end.is_none()
                    && self.min_latitude.is_none()
                    && self.max_latitude.is_none()
                    && self.min_longitude.is_none()
                    && self.max_longitude.is_none()
            }
        }
    }
}

impl StationQuery {
    /// Fill in the defaults the services expect
    pub fn with_defaults(mut self) -> Self {
        self.level.get_or_insert_with(|| "channel".to_string());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        check_range("latitude", self.min_latitude, self.max_latitude)?;
        check_range("longitude", self.min_longitude, self.max_longitude)?;
        if let Some(level) = &self.level {
            if !matches!(level.as_str(), "network" | "station" | "channel" | "response") {
                return Err(format!("unknown station level '{}'", level));
            }
        }
        Ok(())
    }

    pub fn matches_network(&self, network: &Network) -> bool {
        self.network.as_deref().map_or(true, |p| code_matches(p, &network.code))
    }

    pub fn matches_station(&self, station: &Station) -> bool {
        self.station.as_deref().map_or(true, |p| code_matches(p, &station.code))
            && within(station.latitude, self.min_latitude, self.max_latitude)
            && within(station.longitude, self.min_longitude, self.max_longitude)
    }

    pub fn matches_channel(&self, channel: &Channel) -> bool {
        self.location.as_deref().map_or(true, |p| code_matches(p, &channel.location_code))
            && self.channel.as_deref().map_or(true, |p| code_matches(p, &channel.code))
    }

    /// Whether channel level detail was requested
    pub fn wants_channels(&self) -> bool {
        matches!(self.level.as_deref(), None | Some("channel") | Some("response"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sw_core::{Magnitude, Origin};

    fn event(hour: u32, lat: f64, mag: Option<f64>) -> Event {
        let mut event = Event::new(
            format!("ev{}", hour),
            Origin {
                time: Utc.with_ymd_and_hms(2021, 12, 27, hour, 0, 0).unwrap(),
                latitude: lat,
                longitude: -81.0,
                depth_km: 5.0,
            },
        );
        event.preferred_magnitude = mag.map(|value| Magnitude { value, kind: None });
        event
    }

    #[test]
    fn test_wildcards() {
        assert!(code_matches("HH?,HN?", "HNZ"));
        assert!(code_matches("HH?,HN?", "HHE"));
        assert!(!code_matches("HH?,HN?", "BHZ"));
        assert!(code_matches("*", "ANYTHING"));
        assert!(code_matches("B*D", "BIRD"));
        assert!(code_matches("--", ""));
        assert!(!code_matches("00", ""));
        assert!(code_matches("co", "CO"));
    }

    #[test]
    fn test_event_query_filters() {
        let query = EventQuery {
            start: Some(Utc.with_ymd_and_hms(2021, 12, 27, 2, 0, 0).unwrap()),
            min_latitude: Some(33.0),
            max_latitude: Some(35.0),
            min_magnitude: Some(3.0),
            ..Default::default()
        };
        assert!(query.matches(&event(3, 34.0, Some(3.5))));
        assert!(!query.matches(&event(1, 34.0, Some(3.5))));
        assert!(!query.matches(&event(3, 36.0, Some(3.5))));
        assert!(!query.matches(&event(3, 34.0, Some(2.5))));
        assert!(!query.matches(&event(3, 34.0, None)));
    }

    #[test]
    fn test_event_query_validation() {
        let t = Utc.with_ymd_and_hms(2021, 12, 27, 0, 0, 0).unwrap();
        let query = EventQuery { start: Some(t), end: Some(t), ..Default::default() };
        assert!(query.validate().is_err());

        let query = EventQuery { min_latitude: Some(40.0), max_latitude: Some(30.0), ..Default::default() };
        assert!(query.validate().is_err());

        let query = EventQuery::default().with_defaults();
        assert_eq!(query.order_by.as_deref(), Some("time-asc"));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_station_query_defaults() {
        let query = StationQuery::default().with_defaults();
        assert_eq!(query.level.as_deref(), Some("channel"));
        assert!(query.wants_channels());

        let query = StationQuery { level: Some("station".into()), ..Default::default() }.with_defaults();
        assert!(!query.wants_channels());
        assert!(StationQuery { level: Some("bogus".into()), ..Default::default() }.validate().is_err());
    }

    #[test]
    fn test_station_query_matching() {
        let query = StationQuery {
            network: Some("CO,N4".into()),
            station: Some("BIRD,JSC".into()),
            channel: Some("HH?".into()),
            ..Default::default()
        };
        assert!(query.matches_network(&Network::new("N4", vec![])));
        assert!(!query.matches_network(&Network::new("US", vec![])));
        assert!(query.matches_station(&Station::new("JSC", 34.0, -81.0)));
        assert!(!query.matches_station(&Station::new("JKYD", 34.0, -81.0)));
        assert!(query.matches_channel(&Channel::new("00", "HHZ")));
        assert!(!query.matches_channel(&Channel::new("00", "HNZ")));
    }
}
