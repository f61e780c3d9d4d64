//! Leveled cursor over the stations of an inventory

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use sw_core::{CursorPosition, Inventory, Network, Station};
use tracing::{debug, info};

use crate::config::StationQuery;
use crate::sources::{load_station_table, NoDataExt, StationSource};
use crate::{Capability, CursorError};

/// Where the stations come from
pub enum StationInput {
    Inventory(Inventory),
    /// JSON inventory, or a channel table when the extension is `.csv`
    File(PathBuf),
    Query {
        source: Arc<dyn StationSource>,
        query: StationQuery,
    },
}

/// Walks every station of every network, network order first
pub struct StationCursor {
    inventory: Arc<Inventory>,
    stations: Vec<(Arc<Network>, Arc<Station>)>,
    position: CursorPosition,
}

impl StationCursor {
    pub async fn new(input: StationInput) -> Result<Self, CursorError> {
        let inventory = match input {
            StationInput::Inventory(inventory) => inventory,
            StationInput::File(path) => {
                let is_table = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
                let inventory = tokio::task::spawn_blocking(move || -> Result<Inventory, CursorError> {
                    if is_table {
                        return load_station_table(&path);
                    }
                    let reader = BufReader::new(File::open(&path)?);
                    Ok(serde_json::from_reader(reader)?)
                })
                .await??;
                info!("Loaded {} stations from file", inventory.station_count());
                inventory
            }
            StationInput::Query { source, query } => {
                query.validate().map_err(CursorError::Config)?;
                let query = query.with_defaults();
                debug!("Fetching stations from {}", source.source_name());
                let inventory = source
                    .fetch_stations(&query)
                    .await
                    .empty_on_no_data()
                    .map_err(|e| CursorError::fetch(Capability::Stations, source.source_name(), e))?;
                info!(
                    "Fetched {} stations from {}",
                    inventory.station_count(),
                    source.source_name()
                );
                inventory
            }
        };
        Ok(Self::from_inventory(inventory))
    }

    pub fn from_inventory(inventory: Inventory) -> Self {
        let stations = inventory
            .networks
            .iter()
            .flat_map(|network| {
                network
                    .stations
                    .iter()
                    .map(move |station| (network.clone(), station.clone()))
            })
            .collect();
        Self {
            inventory: Arc::new(inventory),
            stations,
            position: CursorPosition::BeforeStart,
        }
    }

    fn current(&self) -> Option<(Arc<Network>, Arc<Station>)> {
        self.position.index().map(|idx| self.stations[idx].clone())
    }

    pub fn next(&mut self) -> Option<(Arc<Network>, Arc<Station>)> {
        self.position = self.position.next_in(self.stations.len());
        self.current()
    }

    pub fn prev(&mut self) -> Option<(Arc<Network>, Arc<Station>)> {
        self.position = self.position.prev_in(self.stations.len());
        self.current()
    }

    pub fn beginning(&mut self) {
        self.position = CursorPosition::BeforeStart;
    }

    /// Move past the last station, so `prev()` lands on it
    pub fn ending(&mut self) {
        self.position = CursorPosition::PastEnd;
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn set_position(&mut self, position: CursorPosition) {
        self.position = match position {
            CursorPosition::At(idx) if idx >= self.stations.len() => CursorPosition::PastEnd,
            other => other,
        };
    }

    /// The inventory the stations were flattened from
    pub fn inventory(&self) -> Arc<Inventory> {
        self.inventory.clone()
    }
}
