use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network → station → channel metadata tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub networks: Vec<Arc<Network>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// FDSN network code, e.g. `CO`
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stations: Vec<Arc<Station>>,
}

/// A recording site and the channels it operates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation_m: f64,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// One data stream of a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Band, instrument and orientation code, e.g. `HHZ`
    pub code: String,
    #[serde(default)]
    pub location_code: String,
    #[serde(default)]
    pub sample_rate: f64,
    /// Sensor description from the metadata, if any
    #[serde(default)]
    pub sensor: Option<String>,
}

/// Fully qualified network.station.location.channel identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId {
    pub network: String,
    pub station: String,
    #[serde(default)]
    pub location: String,
    pub channel: String,
}

#[derive(Debug, Error, PartialEq)]
#[error("expected NET.STA.LOC.CHA, got '{0}'")]
pub struct ChannelIdParseError(pub String);

impl Inventory {
    pub fn new(networks: Vec<Network>) -> Self {
        Self {
            networks: networks.into_iter().map(Arc::new).collect(),
        }
    }

    /// Total number of stations across all networks
    pub fn station_count(&self) -> usize {
        self.networks.iter().map(|n| n.stations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.station_count() == 0
    }

    /// Look up a station by network and station code
    pub fn find_station(&self, network: &str, station: &str) -> Option<(&Arc<Network>, &Arc<Station>)> {
        self.networks
            .iter()
            .filter(|n| n.code == network)
            .find_map(|n| n.stations.iter().find(|s| s.code == station).map(|s| (n, s)))
    }
}

impl Network {
    pub fn new(code: impl Into<String>, stations: Vec<Station>) -> Self {
        Self {
            code: code.into(),
            description: None,
            stations: stations.into_iter().map(Arc::new).collect(),
        }
    }
}

impl Station {
    pub fn new(code: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            code: code.into(),
            latitude,
            longitude,
            elevation_m: 0.0,
            channels: Vec::new(),
        }
    }

    pub fn with_channel(mut self, location_code: &str, code: &str) -> Self {
        self.channels.push(Channel::new(location_code, code));
        self
    }
}

impl Channel {
    pub fn new(location_code: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            location_code: location_code.into(),
            sample_rate: 0.0,
            sensor: None,
        }
    }

    pub fn band(&self) -> Option<char> {
        self.code.chars().next()
    }

    pub fn instrument(&self) -> Option<char> {
        self.code.chars().nth(1)
    }

    pub fn orientation(&self) -> Option<char> {
        self.code.chars().nth(2)
    }
}

impl ChannelId {
    pub fn new(network: &str, station: &str, location: &str, channel: &str) -> Self {
        Self {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
        }
    }

    /// Band and instrument code, the first two characters of the channel
    pub fn band_instrument(&self) -> (Option<char>, Option<char>) {
        let mut chars = self.channel.chars();
        (chars.next(), chars.next())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.network, self.station, self.location, self.channel)
    }
}

impl FromStr for ChannelId {
    type Err = ChannelIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [net, sta, loc, cha] if !net.is_empty() && !sta.is_empty() && !cha.is_empty() => {
                Ok(ChannelId::new(net, sta, loc, cha))
            }
            _ => Err(ChannelIdParseError(s.to_string())),
        }
    }
}
