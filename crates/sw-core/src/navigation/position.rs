use serde::{Deserialize, Serialize};

use super::Direction;

/// Position of a leveled cursor over a sequence of `len` items
///
/// The two sentinels stand in for index `-1` and index `len`. Moving past
/// either end parks the cursor on the sentinel; there is no wraparound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorPosition {
    /// Before the first item
    #[default]
    BeforeStart,
    /// On the item with this index
    At(usize),
    /// After the last item
    PastEnd,
}

impl CursorPosition {
    /// Position after one forward step
    pub fn next_in(self, len: usize) -> CursorPosition {
        match self {
            CursorPosition::BeforeStart if len > 0 => CursorPosition::At(0),
            CursorPosition::At(idx) if idx + 1 < len => CursorPosition::At(idx + 1),
            _ => CursorPosition::PastEnd,
        }
    }

    /// Position after one backward step
    pub fn prev_in(self, len: usize) -> CursorPosition {
        match self {
            CursorPosition::PastEnd if len > 0 => CursorPosition::At(len - 1),
            CursorPosition::At(idx) if idx > 0 && len > 0 => CursorPosition::At((idx - 1).min(len - 1)),
            _ => CursorPosition::BeforeStart,
        }
    }

    pub fn step_in(self, direction: Direction, len: usize) -> CursorPosition {
        match direction {
            Direction::Forward => self.next_in(len),
            Direction::Backward => self.prev_in(len),
        }
    }

    /// Index of the current item, `None` on a sentinel
    pub fn index(self) -> Option<usize> {
        match self {
            CursorPosition::At(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn is_sentinel(self) -> bool {
        self.index().is_none()
    }

    /// Signed index in `[-1, len]`
    pub fn ordinal(self, len: usize) -> isize {
        match self {
            CursorPosition::BeforeStart => -1,
            CursorPosition::At(idx) => idx as isize,
            CursorPosition::PastEnd => len as isize,
        }
    }
}
