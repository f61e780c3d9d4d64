//! Offline archive serving events, stations and waveforms from memory

use std::cmp::Ordering;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sw_core::{Event, Inventory, Network, Station, Trace, WaveformBundle};
use tracing::debug;

use super::{EventSource, StationSource, WaveformRequest, WaveformSource};
use crate::config::{EventQuery, StationQuery};
use crate::{CursorError, FetchError};

/// Serialized form of an archive
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveContents {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub traces: Vec<Trace>,
}

/// Request counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub event_requests: usize,
    pub station_requests: usize,
    pub waveform_requests: usize,
}

/// In-memory event catalog, inventory and trace store
///
/// Answers queries the way a remote service would, including `NoData`
/// when nothing matches.
pub struct Archive {
    name: String,
    contents: ArchiveContents,
    stats: Arc<RwLock<ArchiveStats>>,
}

impl Archive {
    pub fn new(name: impl Into<String>, contents: ArchiveContents) -> Self {
        Self {
            name: name.into(),
            contents,
            stats: Arc::new(RwLock::new(ArchiveStats::default())),
        }
    }

    /// Load an archive from a JSON file
    pub async fn load(path: &Path) -> Result<Self, CursorError> {
        let path: PathBuf = path.to_path_buf();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("archive")
            .to_string();
        let contents = tokio::task::spawn_blocking(move || -> Result<ArchiveContents, CursorError> {
            let reader = BufReader::new(File::open(&path)?);
            Ok(serde_json::from_reader(reader)?)
        })
        .await??;
        debug!(
            "Loaded archive {}: {} events, {} stations, {} traces",
            name,
            contents.events.len(),
            contents.inventory.station_count(),
            contents.traces.len()
        );
        Ok(Self::new(name, contents))
    }

    pub fn contents(&self) -> &ArchiveContents {
        &self.contents
    }

    pub fn stats(&self) -> ArchiveStats {
        self.stats.read().clone()
    }

    fn filter_network(network: &Network, query: &StationQuery) -> Option<Network> {
        if !query.matches_network(network) {
            return None;
        }
        let filter_channels = query.location.is_some() || query.channel.is_some();
        let stations: Vec<Station> = network
            .stations
            .iter()
            .filter(|s| query.matches_station(s))
            .filter_map(|s| {
                let mut station = Station::clone(s);
                if query.wants_channels() {
                    station.channels.retain(|c| query.matches_channel(c));
                    if filter_channels && station.channels.is_empty() {
                        return None;
                    }
                } else {
                    station.channels.clear();
                }
                Some(station)
            })
            .collect();
        if stations.is_empty() {
            return None;
        }
        let mut filtered = Network::new(network.code.clone(), stations);
        filtered.description = network.description.clone();
        Some(filtered)
    }
}

/// Total order on optional magnitudes, unknown ones first
fn compare_magnitudes(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

#[async_trait]
impl EventSource for Archive {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>, FetchError> {
        self.stats.write().event_requests += 1;
        let mut events: Vec<Event> = self
            .contents
            .events
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();

        let magnitude = |e: &Event| e.preferred_magnitude.as_ref().map(|m| m.value);
        match query.order_by.as_deref() {
            Some("time") => events.sort_by(|a, b| b.origin_time().cmp(&a.origin_time())),
            Some("magnitude") => events.sort_by(|a, b| compare_magnitudes(magnitude(b), magnitude(a))),
            Some("magnitude-asc") => events.sort_by(|a, b| compare_magnitudes(magnitude(a), magnitude(b))),
            _ => events.sort_by_key(|e| e.origin_time()),
        }
        if let Some(limit) = query.limit {
            events.truncate(limit);
        }

        debug!("{}: {} events match", self.name, events.len());
        if events.is_empty() {
            return Err(FetchError::NoData);
        }
        Ok(events)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl StationSource for Archive {
    async fn fetch_stations(&self, query: &StationQuery) -> Result<Inventory, FetchError> {
        self.stats.write().station_requests += 1;
        let networks: Vec<Network> = self
            .contents
            .inventory
            .networks
            .iter()
            .filter_map(|n| Self::filter_network(n, query))
            .collect();
        let inventory = Inventory::new(networks);

        debug!("{}: {} stations match", self.name, inventory.station_count());
        if inventory.is_empty() {
            return Err(FetchError::NoData);
        }
        Ok(inventory)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl WaveformSource for Archive {
    async fn fetch_waveforms(&self, request: &WaveformRequest) -> Result<WaveformBundle, FetchError> {
        self.stats.write().waveform_requests += 1;
        let bundle: WaveformBundle = self
            .contents
            .traces
            .iter()
            .filter(|t| {
                t.id.network == request.network
                    && t.id.station == request.station
                    && request.locations.contains(&t.id.location)
                    && request.channels.contains(&t.id.channel)
            })
            .filter_map(|t| t.slice(&request.window))
            .collect();

        debug!("{}: {} traces for {}", self.name, bundle.len(), request.station_label());
        if bundle.is_empty() {
            return Err(FetchError::NoData);
        }
        Ok(bundle)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
