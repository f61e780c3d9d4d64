//! Per-pair time window calculation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sw_core::geodesy::locations_to_degrees;
use sw_core::{duration_from_secs, Event, Origin, Station, TimeWindow};
use thiserror::Error;

use crate::config::{WindowAnchor, WindowBoundary, WindowConfig};
use crate::sources::TravelTimeModel;
use crate::CursorError;

/// Why no window exists for a pair
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("event {0} has no preferred origin")]
    NoPreferredOrigin(String),

    #[error("no {phases} arrival at {distance_deg:.3}° for depth {depth_km} km")]
    NoArrival {
        phases: String,
        distance_deg: f64,
        depth_km: f64,
    },

    #[error("window boundary {offset_secs} s from {anchor} is out of range")]
    OutOfRange {
        anchor: DateTime<Utc>,
        offset_secs: f64,
    },

    #[error("window end {end} is not after start {start}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Computes the data window for a station and an event
pub struct WindowCalculator {
    config: WindowConfig,
    model: Arc<dyn TravelTimeModel>,
}

impl WindowCalculator {
    pub fn new(config: WindowConfig, model: Arc<dyn TravelTimeModel>) -> Result<Self, CursorError> {
        config.validate().map_err(CursorError::Config)?;
        Ok(Self { config, model })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn window_for(&self, station: &Station, event: &Event) -> Result<TimeWindow, WindowError> {
        let origin = event
            .preferred_origin
            .as_ref()
            .ok_or_else(|| WindowError::NoPreferredOrigin(event.id.clone()))?;
        let distance_deg =
            locations_to_degrees(station.latitude, station.longitude, origin.latitude, origin.longitude);

        let start = self.boundary_time(&self.config.start, origin, distance_deg)?;
        let end = self.boundary_time(&self.config.end, origin, distance_deg)?;
        if end <= start {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(TimeWindow::new(start, end))
    }

    fn boundary_time(
        &self,
        boundary: &WindowBoundary,
        origin: &Origin,
        distance_deg: f64,
    ) -> Result<DateTime<Utc>, WindowError> {
        let anchor = match &boundary.phases {
            WindowAnchor::Origin => origin.time,
            WindowAnchor::Phases(phases) => {
                let first = self
                    .model
                    .arrivals(origin.depth_km, distance_deg, phases)
                    .into_iter()
                    .map(|a| a.time)
                    .min_by(f64::total_cmp)
                    .ok_or_else(|| WindowError::NoArrival {
                        phases: phases.join(","),
                        distance_deg,
                        depth_km: origin.depth_km,
                    })?;
                shift(origin.time, first)?
            }
        };
        shift(anchor, boundary.offset)
    }
}

fn shift(time: DateTime<Utc>, secs: f64) -> Result<DateTime<Utc>, WindowError> {
    time.checked_add_signed(duration_from_secs(secs)).ok_or(WindowError::OutOfRange {
        anchor: time,
        offset_secs: secs,
    })
}
