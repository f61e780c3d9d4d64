//! Session configuration for a whole traversal

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{EventQuery, StationQuery, WindowConfig};
use crate::CursorError;

/// Longest event page accepted, a century
const MAX_PAGE_DAYS: f64 = 36_525.0;

/// Where the events come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventInputConfig {
    /// A JSON catalog on disk
    File { path: PathBuf },
    /// A query against the event service, optionally fetched in pages of `page_days`
    Query {
        #[serde(default)]
        query: EventQuery,
        #[serde(default)]
        page_days: Option<f64>,
    },
}

/// Where the stations come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StationInputConfig {
    /// A JSON inventory or CSV channel table on disk
    File { path: PathBuf },
    /// A query against the station service
    Query {
        #[serde(default)]
        query: StationQuery,
    },
}

/// Everything needed to set up a traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Offline archive serving events, stations and waveforms
    pub archive: Option<PathBuf>,
    pub events: EventInputConfig,
    pub stations: StationInputConfig,
    pub window: WindowConfig,
    /// Split each station into same band/instrument channel groups
    pub group_by_instrument: bool,
    /// Visits remembered on each side of the current one, 0 disables caching
    pub cache_size: usize,
    /// Waveform request timeout, e.g. `15s`
    pub timeout: String,
}

impl Default for EventInputConfig {
    fn default() -> Self {
        EventInputConfig::Query {
            query: EventQuery::default(),
            page_days: None,
        }
    }
}

impl Default for StationInputConfig {
    fn default() -> Self {
        StationInputConfig::Query {
            query: StationQuery::default(),
        }
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            archive: None,
            events: EventInputConfig::default(),
            stations: StationInputConfig::default(),
            window: WindowConfig::default(),
            group_by_instrument: true,
            cache_size: 10,
            timeout: "30s".to_string(),
        }
    }
}

impl TraversalConfig {
    /// Load and validate a JSON configuration file
    pub async fn load(path: &Path) -> Result<Self, CursorError> {
        let text = tokio::fs::read_to_string(path).await?;
        let mut config: TraversalConfig = serde_json::from_str(&text)?;
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        config.validate()?;
        Ok(config)
    }

    /// Make relative file paths relative to the directory holding the config
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(archive) = self.archive.as_mut() {
            resolve(archive);
        }
        if let EventInputConfig::File { path } = &mut self.events {
            resolve(path);
        }
        if let StationInputConfig::File { path } = &mut self.stations {
            resolve(path);
        }
    }

    pub fn fetch_timeout(&self) -> Result<Duration, CursorError> {
        humantime::parse_duration(&self.timeout)
            .map_err(|e| CursorError::Config(format!("invalid timeout '{}': {}", self.timeout, e)))
    }

    /// Reject malformed parameters before any cursor is built
    pub fn validate(&self) -> Result<(), CursorError> {
        self.window.validate().map_err(CursorError::Config)?;
        if self.fetch_timeout()?.is_zero() {
            return Err(CursorError::Config("timeout must be positive".to_string()));
        }
        match &self.events {
            EventInputConfig::File { .. } => {}
            EventInputConfig::Query { query, page_days } => {
                query.validate().map_err(CursorError::Config)?;
                if let Some(days) = page_days {
                    if !(days.is_finite() && *days > 0.0) {
                        return Err(CursorError::Config(format!("page_days must be positive, got {}", days)));
                    }
                    if *days > MAX_PAGE_DAYS {
                        return Err(CursorError::Config(format!(
                            "page_days {} exceeds the {} day limit",
                            days, MAX_PAGE_DAYS
                        )));
                    }
                    if query.start.is_none() || query.end.is_none() {
                        return Err(CursorError::Config(
                            "paged event queries need both start and end".to_string(),
                        ));
                    }
                }
            }
        }
        if let StationInputConfig::Query { query } = &self.stations {
            query.validate().map_err(CursorError::Config)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{WindowAnchor, WindowBoundary};

    const SAMPLE: &str = r#"{
        "archive": "archive.json",
        "events": {
            "kind": "query",
            "query": {
                "start": "2021-12-27T00:00:00Z",
                "end": "2022-01-27T00:00:00Z",
                "min_latitude": 33, "max_latitude": 35,
                "min_magnitude": 3.0
            },
            "page_days": 7
        },
        "stations": {
            "kind": "query",
            "query": { "network": "CO,TA,N4,US", "channel": "HH?,HN?" }
        },
        "window": {
            "start": { "phases": "origin", "offset": -30 },
            "end": { "phases": "origin", "offset": 120 }
        },
        "timeout": "15s"
    }"#;

    #[test]
    fn test_sample_config() {
        let mut config: TraversalConfig = serde_json::from_str(SAMPLE).unwrap();
        config.resolve_paths(Path::new("/data/session"));
        assert!(config.validate().is_ok());
        assert_eq!(config.archive.as_deref(), Some(Path::new("/data/session/archive.json")));
        assert_eq!(config.fetch_timeout().unwrap(), Duration::from_secs(15));
        assert!(config.group_by_instrument);
        assert_eq!(config.cache_size, 10);
        assert_eq!(config.window.start, WindowBoundary::origin(-30.0));
        assert_eq!(config.window.end.phases, WindowAnchor::Origin);
    }

    #[test]
    fn test_paged_query_needs_bounds() {
        let config = TraversalConfig {
            events: EventInputConfig::Query {
                query: EventQuery::default(),
                page_days: Some(30.0),
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CursorError::Config(_))));
    }

    #[test]
    fn test_page_days_bounded() {
        let mut config: TraversalConfig = serde_json::from_str(SAMPLE).unwrap();
        if let EventInputConfig::Query { page_days, .. } = &mut config.events {
            *page_days = Some(1e8);
        }
        assert!(matches!(config.validate(), Err(CursorError::Config(_))));
    }

    #[test]
    fn test_bad_timeout() {
        let config = TraversalConfig {
            timeout: "soon".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CursorError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = TraversalConfig::load(&path).await.unwrap();
        assert_eq!(config.archive, Some(dir.path().join("archive.json")));
    }
}
