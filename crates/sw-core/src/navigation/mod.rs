//! Navigation vocabulary shared by every cursor

mod position;
mod step;

pub use position::CursorPosition;
pub use step::{Direction, Step, Visit};
