//! Data sources and traversal cursors for stepping through event × station pairs

pub mod config;
pub mod cursors;
pub mod session;
pub mod sources;
pub mod traversal;

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use config::{EventQuery, StationQuery, TraversalConfig, WindowAnchor, WindowBoundary, WindowConfig};
pub use cursors::{
    CachedCursor, EventCursor, EventInput, EventPaging, GroupSplitCursor, PairCursor, SeismogramCursor,
    StationCursor, StationInput, WindowCalculator, WindowError,
};
pub use session::{Command, Outcome, Session};
pub use sources::{
    Archive, EventSource, HomogeneousEarth, StationSource, TravelTimeModel, WaveformRequest, WaveformSource,
};
pub use traversal::{Traversal, TraversalBuilder};

/// Errors raised by a capability (event, station or waveform service)
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No data matched the request")]
    NoData,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which capability a failed fetch went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Events,
    Stations,
    Waveforms,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Events => write!(f, "event"),
            Capability::Stations => write!(f, "station"),
            Capability::Waveforms => write!(f, "waveform"),
        }
    }
}

/// Errors that can occur while building or moving a cursor
#[derive(Error, Debug)]
pub enum CursorError {
    #[error("{capability} fetch failed for {context}: {source}")]
    Fetch {
        capability: Capability,
        context: String,
        #[source]
        source: FetchError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for CursorError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => CursorError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => CursorError::Csv(error.to_string()),
        }
    }
}

impl CursorError {
    pub fn fetch(capability: Capability, context: impl Into<String>, source: FetchError) -> Self {
        CursorError::Fetch {
            capability,
            context: context.into(),
            source,
        }
    }

    /// Whether retrying the same step may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, CursorError::Fetch { .. })
    }
}
