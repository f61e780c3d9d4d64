//! Fixtures shared by the cursor tests

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use sw_core::{
    Arrival, ChannelId, CursorPosition, Event, Inventory, Network, Origin, Station, Step, Trace, Visit,
    WaveformBundle,
};

use super::SeismogramCursor;
use crate::config::EventQuery;
use crate::sources::{EventSource, TravelTimeModel, WaveformRequest, WaveformSource};
use crate::{Capability, CursorError, FetchError};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 11, 24, 16, 0, 0).unwrap()
}

/// Event at `t0 + seconds`
pub fn event_at(id: &str, seconds: i64) -> Event {
    Event::new(
        id,
        Origin {
            time: t0() + Duration::seconds(seconds),
            latitude: 34.5,
            longitude: -80.5,
            depth_km: 5.0,
        },
    )
}

/// Station with location `00` channels
pub fn station(code: &str, channels: &[&str]) -> Station {
    channels
        .iter()
        .fold(Station::new(code, 34.0, -81.0), |s, c| s.with_channel("00", c))
}

pub fn inventory(networks: Vec<(&str, Vec<Station>)>) -> Inventory {
    Inventory::new(networks.into_iter().map(|(code, stations)| Network::new(code, stations)).collect())
}

/// A visit for `CO.<station>` with one trace per channel
pub fn visit(event: &Arc<Event>, station_code: &str, channels: &[&str]) -> Visit {
    let traces = channels
        .iter()
        .map(|c| Trace::new(ChannelId::new("CO", station_code, "00", c), t0(), 1.0, vec![0.0; 4]))
        .collect();
    Visit {
        network: Arc::new(Network::new("CO", vec![])),
        station: Arc::new(station(station_code, channels)),
        event: event.clone(),
        window: None,
        waveforms: WaveformBundle::new(traces),
    }
}

/// Label of a step as `event/station/channels`, or `END`
pub fn label(step: &Step) -> String {
    match step {
        Step::Data(v) => format!("{}/{}/{}", v.event.id, v.station.code, v.waveforms.channel_codes().join(",")),
        Step::End => "END".to_string(),
    }
}

/// Waveform service answering every request with one trace per channel
#[derive(Default)]
pub struct MockWaveforms {
    requests: Mutex<Vec<WaveformRequest>>,
    no_data: Mutex<HashSet<String>>,
    failures: Mutex<usize>,
}

impl MockWaveforms {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn no_data_for(&self, station: &str) {
        self.no_data.lock().insert(station.to_string());
    }

    /// Fail the next `count` requests with a transport error
    pub fn fail_next(&self, count: usize) {
        *self.failures.lock() = count;
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<WaveformRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl WaveformSource for MockWaveforms {
    async fn fetch_waveforms(&self, request: &WaveformRequest) -> Result<WaveformBundle, FetchError> {
        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(FetchError::Transport("connection reset".to_string()));
            }
        }
        self.requests.lock().push(request.clone());
        if self.no_data.lock().contains(&request.station) {
            return Err(FetchError::NoData);
        }
        let mut traces = Vec::new();
        for location in &request.locations {
            for channel in &request.channels {
                traces.push(Trace::new(
                    ChannelId::new(&request.network, &request.station, location, channel),
                    request.window.start,
                    1.0,
                    vec![0.0; 8],
                ));
            }
        }
        Ok(WaveformBundle::new(traces))
    }

    fn source_name(&self) -> &str {
        "mock-waveforms"
    }
}

/// Event service over a fixed list, honoring time bounds
#[derive(Default)]
pub struct MockEvents {
    events: Vec<Event>,
    queries: Mutex<Vec<EventQuery>>,
    failures: Mutex<usize>,
}

impl MockEvents {
    pub fn new(events: Vec<Event>) -> Arc<Self> {
        Arc::new(Self {
            events,
            ..Default::default()
        })
    }

    pub fn fail_next(&self, count: usize) {
        *self.failures.lock() = count;
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl EventSource for MockEvents {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>, FetchError> {
        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(FetchError::Transport("service unavailable".to_string()));
            }
        }
        self.queries.lock().push(query.clone());
        let events: Vec<Event> = self.events.iter().filter(|e| query.matches(e)).cloned().collect();
        if events.is_empty() {
            return Err(FetchError::NoData);
        }
        Ok(events)
    }

    fn source_name(&self) -> &str {
        "mock-events"
    }
}

/// Travel times looked up from a fixed phase → seconds table
pub struct FixedTravelTimes(pub HashMap<String, f64>);

impl FixedTravelTimes {
    pub fn new(entries: &[(&str, f64)]) -> Arc<Self> {
        Arc::new(Self(entries.iter().map(|(p, t)| (p.to_string(), *t)).collect()))
    }
}

impl TravelTimeModel for FixedTravelTimes {
    fn arrivals(&self, _depth_km: f64, distance_deg: f64, phases: &[String]) -> Vec<Arrival> {
        let mut arrivals: Vec<Arrival> = phases
            .iter()
            .filter_map(|p| {
                self.0.get(p).map(|time| Arrival {
                    phase: p.clone(),
                    time: *time,
                    distance_deg,
                })
            })
            .collect();
        arrivals.sort_by(|a, b| a.time.total_cmp(&b.time));
        arrivals
    }
}

/// Cursor over a fixed list of visits that counts every move
pub struct VecCursor {
    visits: Vec<Visit>,
    position: CursorPosition,
    pub moves: Arc<Mutex<usize>>,
    pub failures: Arc<Mutex<usize>>,
}

impl VecCursor {
    pub fn new(visits: Vec<Visit>) -> Self {
        Self {
            visits,
            position: CursorPosition::BeforeStart,
            moves: Arc::new(Mutex::new(0)),
            failures: Arc::new(Mutex::new(0)),
        }
    }

    fn take_failure(&self) -> Result<(), CursorError> {
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            return Err(CursorError::fetch(
                Capability::Waveforms,
                "test",
                FetchError::Transport("injected".to_string()),
            ));
        }
        Ok(())
    }

    fn current(&self) -> Step {
        self.position.index().map(|i| self.visits[i].clone()).into()
    }
}

#[async_trait]
impl SeismogramCursor for VecCursor {
    async fn next(&mut self) -> Result<Step, CursorError> {
        self.take_failure()?;
        *self.moves.lock() += 1;
        self.position = self.position.next_in(self.visits.len());
        Ok(self.current())
    }

    async fn prev(&mut self) -> Result<Step, CursorError> {
        self.take_failure()?;
        *self.moves.lock() += 1;
        self.position = self.position.prev_in(self.visits.len());
        Ok(self.current())
    }

    fn beginning(&mut self) {
        self.position = CursorPosition::BeforeStart;
    }
}
