//! Value types handed between the cursors and their collaborators

mod event;
mod inventory;
mod waveform;
mod window;

pub use event::{Event, Magnitude, Origin, Pick};
pub use inventory::{Channel, ChannelId, Inventory, Network, Station};
pub use waveform::{Trace, WaveformBundle};
pub use window::{duration_from_secs, Arrival, TimeWindow};
