//! Query, window and session configuration

pub mod query;
pub mod traversal;
pub mod window;

pub use query::{code_matches, EventQuery, StationQuery};
pub use traversal::{EventInputConfig, StationInputConfig, TraversalConfig};
pub use window::{WindowAnchor, WindowBoundary, WindowConfig};
