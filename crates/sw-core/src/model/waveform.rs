use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::window::duration_from_secs;
use super::{ChannelId, TimeWindow};

/// A contiguous, evenly sampled time series from one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub id: ChannelId,
    /// Time of the first sample
    pub start: DateTime<Utc>,
    /// Samples per second
    pub sample_rate: f64,
    pub samples: Arc<[f32]>,
}

/// All traces fetched for one (event, station) pair; may be empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveformBundle {
    #[serde(default)]
    pub traces: Vec<Trace>,
}

impl Trace {
    pub fn new(id: ChannelId, start: DateTime<Utc>, sample_rate: f64, samples: Vec<f32>) -> Self {
        Self {
            id,
            start,
            sample_rate,
            samples: samples.into(),
        }
    }

    /// Time of the last sample
    pub fn end(&self) -> DateTime<Utc> {
        if self.samples.is_empty() || self.sample_rate <= 0.0 {
            return self.start;
        }
        self.start + duration_from_secs((self.samples.len() - 1) as f64 / self.sample_rate)
    }

    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end())
    }

    /// Cut the trace to the samples falling inside `window`
    pub fn slice(&self, window: &TimeWindow) -> Option<Trace> {
        if self.samples.is_empty() || self.sample_rate <= 0.0 || !self.time_window().overlaps(window) {
            return None;
        }
        let offset = |t: DateTime<Utc>| {
            let micros = (t - self.start).num_microseconds().unwrap_or(i64::MAX) as f64;
            micros / 1_000_000.0 * self.sample_rate
        };
        let first = offset(window.start).ceil().max(0.0) as usize;
        let last = (offset(window.end).floor() as usize).min(self.samples.len() - 1);
        if first > last {
            return None;
        }
        Some(Trace {
            id: self.id.clone(),
            start: self.start + duration_from_secs(first as f64 / self.sample_rate),
            sample_rate: self.sample_rate,
            samples: self.samples[first..=last].into(),
        })
    }
}

impl WaveformBundle {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trace> {
        self.traces.iter()
    }

    /// Channel codes in trace order, e.g. `["HHZ", "HHN"]`
    pub fn channel_codes(&self) -> Vec<&str> {
        self.traces.iter().map(|t| t.id.channel.as_str()).collect()
    }
}

impl FromIterator<Trace> for WaveformBundle {
    fn from_iter<I: IntoIterator<Item = Trace>>(iter: I) -> Self {
        Self {
            traces: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for WaveformBundle {
    type Item = Trace;
    type IntoIter = std::vec::IntoIter<Trace>;

    fn into_iter(self) -> Self::IntoIter {
        self.traces.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn trace() -> Trace {
        let start = Utc.with_ymd_and_hms(2022, 11, 24, 16, 0, 0).unwrap();
        Trace::new(
            ChannelId::new("CO", "BIRD", "00", "HHZ"),
            start,
            10.0,
            (0..100).map(|v| v as f32).collect(),
        )
    }

    #[test]
    fn test_trace_end() {
        let tr = trace();
        assert_eq!(tr.end(), tr.start + Duration::microseconds(9_900_000));
    }

    #[test]
    fn test_slice_inside() {
        let tr = trace();
        let window = TimeWindow::new(tr.start + Duration::seconds(2), tr.start + Duration::seconds(3));
        let cut = tr.slice(&window).unwrap();
        assert_eq!(cut.samples.len(), 11);
        assert_eq!(cut.samples[0], 20.0);
        assert_eq!(cut.start, window.start);
    }

    #[test]
    fn test_slice_outside() {
        let tr = trace();
        let window = TimeWindow::new(tr.start + Duration::seconds(20), tr.start + Duration::seconds(30));
        assert!(tr.slice(&window).is_none());
    }

    #[test]
    fn test_slice_clamps_to_trace() {
        let tr = trace();
        let window = TimeWindow::new(tr.start - Duration::seconds(5), tr.start + Duration::seconds(50));
        let cut = tr.slice(&window).unwrap();
        assert_eq!(cut.samples.len(), 100);
        assert_eq!(cut.start, tr.start);
    }
}
