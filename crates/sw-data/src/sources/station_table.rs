//! Flat CSV channel table → inventory tree

use std::io::Read;
use std::path::Path;

use ahash::RandomState;
use csv::{ReaderBuilder, Trim};
use indexmap::IndexMap;
use serde::Deserialize;
use sw_core::{Channel, Inventory, Network, Station};

use crate::CursorError;

/// One row of the table: a channel and the station carrying it
#[derive(Debug, Deserialize)]
struct ChannelRow {
    network: String,
    station: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    elevation: Option<f64>,
    #[serde(default)]
    location: Option<String>,
    channel: String,
    #[serde(default)]
    sample_rate: Option<f64>,
}

type StationMap = IndexMap<String, Station, RandomState>;

/// Load a `network,station,latitude,longitude,elevation,location,channel,sample_rate` table
///
/// Networks and stations keep the order of their first row. Rows for a
/// station already seen only contribute their channel.
pub fn load_station_table(path: &Path) -> Result<Inventory, CursorError> {
    let file = std::fs::File::open(path)?;
    read_station_table(file)
}

pub fn read_station_table<R: Read>(reader: R) -> Result<Inventory, CursorError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut networks: IndexMap<String, StationMap, RandomState> = IndexMap::default();
    for result in csv_reader.deserialize::<ChannelRow>() {
        let row = result?;
        let station = networks
            .entry(row.network.clone())
            .or_default()
            .entry(row.station.clone())
            .or_insert_with(|| {
                let mut station = Station::new(row.station.clone(), row.latitude, row.longitude);
                station.elevation_m = row.elevation.unwrap_or(0.0);
                station
            });
        let mut channel = Channel::new(row.location.unwrap_or_default(), row.channel);
        channel.sample_rate = row.sample_rate.unwrap_or(0.0);
        station.channels.push(channel);
    }

    Ok(Inventory::new(
        networks
            .into_iter()
            .map(|(code, stations)| Network::new(code, stations.into_values().collect()))
            .collect(),
    ))
}
