//! Core types for walking seismic events against station inventories
//!
//! This crate provides the value types shared by every cursor (events,
//! inventories, waveforms, time windows) together with the navigation
//! vocabulary the cursors speak.

pub mod geodesy;
pub mod model;
pub mod navigation;

// Re-export commonly used types
pub use model::{
    duration_from_secs,
    Arrival, Channel, ChannelId, Event, Inventory, Magnitude, Network, Origin, Pick, Station,
    TimeWindow, Trace, WaveformBundle,
};
pub use navigation::{CursorPosition, Direction, Step, Visit};
