use std::fmt;
use std::sync::Arc;

use crate::model::{Event, Network, Station, TimeWindow, WaveformBundle};

/// Direction of travel through a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "next"),
            Direction::Backward => write!(f, "prev"),
        }
    }
}

/// One materialized (network, station, event, waveform) combination
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub network: Arc<Network>,
    pub station: Arc<Station>,
    pub event: Arc<Event>,
    /// `None` when no window could be computed for the pair
    pub window: Option<TimeWindow>,
    pub waveforms: WaveformBundle,
}

/// Result of moving a cursor one step
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Data(Visit),
    /// Ran off either end of the traversal
    End,
}

impl Visit {
    /// `NET_STA` label used in log lines and summaries
    pub fn station_label(&self) -> String {
        format!("{}_{}", self.network.code, self.station.code)
    }

    pub fn has_data(&self) -> bool {
        !self.waveforms.is_empty()
    }

    /// Same pair, different waveforms
    pub fn with_waveforms(&self, waveforms: WaveformBundle) -> Visit {
        Visit {
            network: self.network.clone(),
            station: self.station.clone(),
            event: self.event.clone(),
            window: self.window,
            waveforms,
        }
    }
}

impl Step {
    pub fn is_end(&self) -> bool {
        matches!(self, Step::End)
    }

    pub fn visit(&self) -> Option<&Visit> {
        match self {
            Step::Data(visit) => Some(visit),
            Step::End => None,
        }
    }

    pub fn into_visit(self) -> Option<Visit> {
        match self {
            Step::Data(visit) => Some(visit),
            Step::End => None,
        }
    }
}

impl From<Option<Visit>> for Step {
    fn from(visit: Option<Visit>) -> Self {
        visit.map_or(Step::End, Step::Data)
    }
}
