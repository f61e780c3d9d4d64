//! Odometer over every (event, station) pair

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sw_core::{CursorPosition, Direction, Event, Inventory, Network, Station, Step, TimeWindow, Visit, WaveformBundle};
use tracing::{debug, trace};

use super::{EventCursor, SeismogramCursor, StationCursor, WindowCalculator};
use crate::sources::{NoDataExt, WaveformRequest, WaveformSource};
use crate::{Capability, CursorError, FetchError};

/// Positions to fall back to when a step fails
struct Checkpoint {
    event: CursorPosition,
    station: CursorPosition,
    current_event: Option<Arc<Event>>,
}

/// Walks the event × station product, stations varying fastest
///
/// The station cursor is the fast digit: when it runs off either end the
/// event cursor moves one step the same way and the stations restart from
/// the matching end. Each visit carries the waveforms for its window, or an
/// empty bundle when no window exists, the station has no channels, or the
/// service has no data. Empty visits are still visits; skipping them is up
/// to the caller.
pub struct PairCursor {
    events: EventCursor,
    stations: StationCursor,
    windows: WindowCalculator,
    waveforms: Arc<dyn WaveformSource>,
    timeout: Duration,
    current_event: Option<Arc<Event>>,
}

impl PairCursor {
    pub fn new(
        events: EventCursor,
        stations: StationCursor,
        windows: WindowCalculator,
        waveforms: Arc<dyn WaveformSource>,
        timeout: Duration,
    ) -> Result<Self, CursorError> {
        if timeout.is_zero() {
            return Err(CursorError::Config("waveform fetch timeout must be positive".to_string()));
        }
        Ok(Self {
            events,
            stations,
            windows,
            waveforms,
            timeout,
            current_event: None,
        })
    }

    pub fn inventory(&self) -> Arc<Inventory> {
        self.stations.inventory()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            event: self.events.position(),
            station: self.stations.position(),
            current_event: self.current_event.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.events.set_position(checkpoint.event);
        self.stations.set_position(checkpoint.station);
        self.current_event = checkpoint.current_event;
    }

    async fn step_pair(&mut self, direction: Direction) -> Result<Step, CursorError> {
        let checkpoint = self.checkpoint();
        let result = self.advance(direction).await;
        if let Err(e) = &result {
            debug!("Pair {} failed, keeping position: {}", direction, e);
            self.restore(checkpoint);
        }
        result
    }

    async fn advance(&mut self, direction: Direction) -> Result<Step, CursorError> {
        loop {
            if let Some(event) = self.current_event.clone() {
                let station = match direction {
                    Direction::Forward => self.stations.next(),
                    Direction::Backward => self.stations.prev(),
                };
                if let Some((network, station)) = station {
                    return self.load(network, station, event).await.map(Step::Data);
                }
            }

            let event = match direction {
                Direction::Forward => self.events.next().await?,
                Direction::Backward => self.events.prev(),
            };
            match event {
                Some(event) => {
                    trace!("Moving to event {}", event.id);
                    self.current_event = Some(event);
                    match direction {
                        Direction::Forward => self.stations.beginning(),
                        Direction::Backward => self.stations.ending(),
                    }
                }
                None => {
                    self.current_event = None;
                    return Ok(Step::End);
                }
            }
        }
    }

    fn request_for(&self, network: &Network, station: &Station, window: TimeWindow) -> Option<WaveformRequest> {
        if station.channels.is_empty() {
            return None;
        }
        let locations: BTreeSet<&str> = station.channels.iter().map(|c| c.location_code.as_str()).collect();
        let channels: BTreeSet<&str> = station.channels.iter().map(|c| c.code.as_str()).collect();
        Some(WaveformRequest {
            network: network.code.clone(),
            station: station.code.clone(),
            locations: locations.into_iter().map(str::to_string).collect(),
            channels: channels.into_iter().map(str::to_string).collect(),
            window,
            timeout: self.timeout,
        })
    }

    async fn load(
        &self,
        network: Arc<Network>,
        station: Arc<Station>,
        event: Arc<Event>,
    ) -> Result<Visit, CursorError> {
        let mut visit = Visit {
            network,
            station,
            event,
            window: None,
            waveforms: WaveformBundle::empty(),
        };

        let window = match self.windows.window_for(&visit.station, &visit.event) {
            Ok(window) => window,
            Err(e) => {
                debug!("No window for {} and event {}: {}", visit.station_label(), visit.event.id, e);
                return Ok(visit);
            }
        };
        visit.window = Some(window);

        let Some(request) = self.request_for(&visit.network, &visit.station, window) else {
            debug!("{} has no channels", visit.station_label());
            return Ok(visit);
        };

        debug!(
            "Fetching {} {} from {} for event {}",
            request.station_label(),
            request.channels.join(","),
            self.waveforms.source_name(),
            visit.event.id
        );
        let fetched = match tokio::time::timeout(self.timeout, self.waveforms.fetch_waveforms(&request)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };
        visit.waveforms = fetched.empty_on_no_data().map_err(|e| {
            CursorError::fetch(
                Capability::Waveforms,
                format!("{}.{} for event {}", request.network, request.station, visit.event.id),
                e,
            )
        })?;
        Ok(visit)
    }
}

#[async_trait]
impl SeismogramCursor for PairCursor {
    async fn next(&mut self) -> Result<Step, CursorError> {
        self.step_pair(Direction::Forward).await
    }

    async fn prev(&mut self) -> Result<Step, CursorError> {
        self.step_pair(Direction::Backward).await
    }

    fn beginning(&mut self) {
        self.events.beginning();
        self.stations.beginning();
        self.current_event = None;
    }
}
