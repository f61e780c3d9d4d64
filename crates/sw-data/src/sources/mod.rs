//! Capabilities the cursors fetch through, and the implementations shipped here

pub mod archive;
pub mod station_table;
pub mod travel_time;

pub use archive::Archive;
pub use station_table::load_station_table;
pub use travel_time::HomogeneousEarth;

use std::time::Duration;

use async_trait::async_trait;
use sw_core::{Arrival, Event, Inventory, TimeWindow, WaveformBundle};

use crate::config::{EventQuery, StationQuery};
use crate::FetchError;

/// Event catalog service
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events matching the query; `FetchError::NoData` when nothing matches
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>, FetchError>;

    /// Get the source name
    fn source_name(&self) -> &str;
}

/// Station metadata service
#[async_trait]
pub trait StationSource: Send + Sync {
    /// Inventory tree matching the query; `FetchError::NoData` when nothing matches
    async fn fetch_stations(&self, query: &StationQuery) -> Result<Inventory, FetchError>;

    /// Get the source name
    fn source_name(&self) -> &str;
}

/// Waveform data service
#[async_trait]
pub trait WaveformSource: Send + Sync {
    /// Traces for the request; `FetchError::NoData` when none are available
    ///
    /// Implementations honor `request.timeout` and report it as `FetchError::Timeout`.
    async fn fetch_waveforms(&self, request: &WaveformRequest) -> Result<WaveformBundle, FetchError>;

    /// Get the source name
    fn source_name(&self) -> &str;
}

/// Travel time predictions from a velocity model
pub trait TravelTimeModel: Send + Sync {
    /// Arrivals of `phases` at this distance and depth, by increasing time; empty if none exist
    fn arrivals(&self, depth_km: f64, distance_deg: f64, phases: &[String]) -> Vec<Arrival>;
}

/// One waveform request for a station over a time window
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformRequest {
    pub network: String,
    pub station: String,
    /// Distinct location codes, sorted
    pub locations: Vec<String>,
    /// Distinct channel codes, sorted
    pub channels: Vec<String>,
    pub window: TimeWindow,
    pub timeout: Duration,
}

impl WaveformRequest {
    /// `NET_STA` label for log lines
    pub fn station_label(&self) -> String {
        format!("{}_{}", self.network, self.station)
    }
}

/// Turns "no data" into an empty result at the capability boundary
pub trait NoDataExt<T> {
    fn empty_on_no_data(self) -> Result<T, FetchError>;
}

impl<T: Default> NoDataExt<T> for Result<T, FetchError> {
    fn empty_on_no_data(self) -> Result<T, FetchError> {
        match self {
            Err(FetchError::NoData) => Ok(T::default()),
            other => other,
        }
    }
}
