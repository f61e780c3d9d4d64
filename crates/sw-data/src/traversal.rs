//! Assembles the cursor stack described by a [`TraversalConfig`]

use std::sync::Arc;

use sw_core::{duration_from_secs, Inventory};
use tracing::info;

use crate::config::{EventInputConfig, StationInputConfig, TraversalConfig};
use crate::cursors::{
    CachedCursor, EventCursor, EventInput, EventPaging, GroupSplitCursor, PairCursor, SeismogramCursor,
    StationCursor, StationInput, WindowCalculator,
};
use crate::sources::{Archive, EventSource, HomogeneousEarth, StationSource, TravelTimeModel, WaveformSource};
use crate::CursorError;

/// A ready to use cursor and the inventory it walks
pub struct Traversal {
    pub cursor: Box<dyn SeismogramCursor>,
    pub inventory: Arc<Inventory>,
}

/// Builds a [`Traversal`] from configuration and the services to fetch through
///
/// Services not given explicitly come from the archive named in the
/// configuration, if any.
pub struct TraversalBuilder {
    config: TraversalConfig,
    events: Option<Arc<dyn EventSource>>,
    stations: Option<Arc<dyn StationSource>>,
    waveforms: Option<Arc<dyn WaveformSource>>,
    travel_times: Arc<dyn TravelTimeModel>,
}

impl TraversalBuilder {
    pub fn new(config: TraversalConfig) -> Self {
        Self {
            config,
            events: None,
            stations: None,
            waveforms: None,
            travel_times: Arc::new(HomogeneousEarth::default()),
        }
    }

    /// Serve events, stations and waveforms from one archive
    pub fn with_archive(self, archive: Arc<Archive>) -> Self {
        Self {
            events: Some(archive.clone()),
            stations: Some(archive.clone()),
            waveforms: Some(archive),
            ..self
        }
    }

    pub fn with_event_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.events = Some(source);
        self
    }

    pub fn with_station_source(mut self, source: Arc<dyn StationSource>) -> Self {
        self.stations = Some(source);
        self
    }

    pub fn with_waveform_source(mut self, source: Arc<dyn WaveformSource>) -> Self {
        self.waveforms = Some(source);
        self
    }

    pub fn with_travel_times(mut self, model: Arc<dyn TravelTimeModel>) -> Self {
        self.travel_times = model;
        self
    }

    pub async fn build(mut self) -> Result<Traversal, CursorError> {
        self.config.validate()?;
        let timeout = self.config.fetch_timeout()?;

        if let Some(path) = self.config.archive.clone() {
            if self.events.is_none() || self.stations.is_none() || self.waveforms.is_none() {
                let archive = Arc::new(Archive::load(&path).await?);
                if self.events.is_none() {
                    self.events = Some(archive.clone());
                }
                if self.stations.is_none() {
                    self.stations = Some(archive.clone());
                }
                if self.waveforms.is_none() {
                    self.waveforms = Some(archive);
                }
            }
        }

        let event_input = match self.config.events.clone() {
            EventInputConfig::File { path } => EventInput::File(path),
            EventInputConfig::Query { query, page_days } => EventInput::Query {
                source: self
                    .events
                    .clone()
                    .ok_or_else(|| CursorError::Config("event query without an event service".to_string()))?,
                query,
                paging: page_days.map_or(EventPaging::Single, |days| EventPaging::Stepped {
                    step: duration_from_secs(days * 86_400.0),
                }),
            },
        };
        let station_input = match self.config.stations.clone() {
            StationInputConfig::File { path } => StationInput::File(path),
            StationInputConfig::Query { query } => StationInput::Query {
                source: self
                    .stations
                    .clone()
                    .ok_or_else(|| CursorError::Config("station query without a station service".to_string()))?,
                query,
            },
        };
        let waveforms = self
            .waveforms
            .clone()
            .ok_or_else(|| CursorError::Config("no waveform service configured".to_string()))?;

        let windows = WindowCalculator::new(self.config.window.clone(), self.travel_times.clone())?;
        let events = EventCursor::new(event_input).await?;
        let stations = StationCursor::new(station_input).await?;
        let pair = PairCursor::new(events, stations, windows, waveforms, timeout)?;
        info!(
            "Traversal over {} events and {} stations",
            pair.event_count(),
            pair.station_count()
        );
        let inventory = pair.inventory();

        let mut cursor: Box<dyn SeismogramCursor> = Box::new(pair);
        if self.config.group_by_instrument {
            cursor = Box::new(GroupSplitCursor::new(cursor));
        }
        if self.config.cache_size > 0 {
            cursor = Box::new(CachedCursor::new(cursor, self.config.cache_size)?);
        }
        Ok(Traversal { cursor, inventory })
    }
}
