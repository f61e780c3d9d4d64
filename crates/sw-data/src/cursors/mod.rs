//! Bidirectional cursors over events, stations and their combinations
//!
//! The leveled cursors ([`EventCursor`], [`StationCursor`]) walk a single
//! sequence. [`PairCursor`] composes them into an odometer over every
//! (event, station) pair and fetches waveforms for the current one.
//! [`GroupSplitCursor`] and [`CachedCursor`] wrap any [`SeismogramCursor`].

mod cached;
mod event;
mod group_split;
mod pair;
mod station;
mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use cached::CachedCursor;
pub use event::{EventCursor, EventInput, EventPaging};
pub use group_split::{split_by_instrument, GroupSplitCursor};
pub use pair::PairCursor;
pub use station::{StationCursor, StationInput};
pub use window::{WindowCalculator, WindowError};

use async_trait::async_trait;
use sw_core::{Direction, Step};

use crate::CursorError;

/// A cursor producing one visit per step in either direction
///
/// Moving past either end yields [`Step::End`] and parks the cursor on that
/// sentinel; moving back from it re-enters the sequence. A failed step
/// leaves the position unchanged so the same call can be retried.
#[async_trait]
pub trait SeismogramCursor: Send {
    async fn next(&mut self) -> Result<Step, CursorError>;

    async fn prev(&mut self) -> Result<Step, CursorError>;

    /// Reset to before the first visit
    fn beginning(&mut self);

    async fn step(&mut self, direction: Direction) -> Result<Step, CursorError> {
        match direction {
            Direction::Forward => self.next().await,
            Direction::Backward => self.prev().await,
        }
    }
}

#[async_trait]
impl<C: SeismogramCursor + ?Sized> SeismogramCursor for Box<C> {
    async fn next(&mut self) -> Result<Step, CursorError> {
        (**self).next().await
    }

    async fn prev(&mut self) -> Result<Step, CursorError> {
        (**self).prev().await
    }

    fn beginning(&mut self) {
        (**self).beginning()
    }
}
