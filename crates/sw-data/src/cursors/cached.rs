//! Bounded back/forward cache over any cursor

use std::collections::VecDeque;
use std::mem;

use async_trait::async_trait;
use sw_core::{Direction, Step, Visit};
use tracing::{debug, trace};

use super::SeismogramCursor;
use crate::CursorError;

/// A materialized position, sentinels included
#[derive(Debug, Clone)]
enum Slot {
    Start,
    Item(Visit),
    End,
}

impl Slot {
    fn from_step(step: Step, direction: Direction) -> Slot {
        match (step, direction) {
            (Step::Data(visit), _) => Slot::Item(visit),
            (Step::End, Direction::Forward) => Slot::End,
            (Step::End, Direction::Backward) => Slot::Start,
        }
    }

    fn to_step(&self) -> Step {
        match self {
            Slot::Item(visit) => Step::Data(visit.clone()),
            Slot::Start | Slot::End => Step::End,
        }
    }
}

fn sign(direction: Direction) -> isize {
    match direction {
        Direction::Forward => 1,
        Direction::Backward => -1,
    }
}

/// Replays recently seen visits without going back to the wrapped cursor
///
/// Holds up to `capacity` visits behind and ahead of the current one. A miss
/// steps the wrapped cursor; if earlier hits moved away from where the
/// wrapped cursor actually is, it is walked back into line first, so the
/// results are always those the wrapped cursor alone would give.
pub struct CachedCursor<C> {
    inner: C,
    capacity: usize,
    current: Slot,
    back: VecDeque<Slot>,
    forward: VecDeque<Slot>,
    /// Wrapped cursor's ordinal minus the logical ordinal
    lead: isize,
    hits: usize,
    misses: usize,
}

impl<C: SeismogramCursor> CachedCursor<C> {
    pub fn new(inner: C, capacity: usize) -> Result<Self, CursorError> {
        if capacity == 0 {
            return Err(CursorError::Config("cache capacity must be at least 1".to_string()));
        }
        Ok(Self {
            inner,
            capacity,
            current: Slot::Start,
            back: VecDeque::with_capacity(capacity),
            forward: VecDeque::with_capacity(capacity),
            lead: 0,
            hits: 0,
            misses: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Change the wrapped cursor, then start over with an empty cache
    pub fn reconfigure<F>(&mut self, f: F)
    where
        F: FnOnce(&mut C),
    {
        f(&mut self.inner);
        self.beginning();
    }

    fn clear(&mut self) {
        self.current = Slot::Start;
        self.back.clear();
        self.forward.clear();
        self.lead = 0;
    }

    /// Step the wrapped cursor until it yields the slot one step from the logical position
    async fn pull(&mut self, direction: Direction) -> Result<Slot, CursorError> {
        let sign = sign(direction);
        while self.lead * sign > 0 {
            self.inner.step(direction.reverse()).await?;
            self.lead -= sign;
        }
        loop {
            let step = self.inner.step(direction).await?;
            self.lead += sign;
            if self.lead == sign || step.is_end() {
                self.lead = 0;
                return Ok(Slot::from_step(step, direction));
            }
        }
    }

    async fn move_cached(&mut self, direction: Direction) -> Result<Step, CursorError> {
        let at_end = match direction {
            Direction::Forward => matches!(self.current, Slot::End),
            Direction::Backward => matches!(self.current, Slot::Start),
        };
        if at_end {
            return Ok(Step::End);
        }

        let ahead = match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.back,
        };
        let slot = match ahead.pop_front() {
            Some(slot) => {
                self.hits += 1;
                self.lead -= sign(direction);
                trace!("Cache hit moving {}", direction);
                slot
            }
            None => {
                self.misses += 1;
                debug!("Cache miss moving {}, lead {}", direction, self.lead);
                self.pull(direction).await?
            }
        };

        let previous = mem::replace(&mut self.current, slot);
        let behind = match direction {
            Direction::Forward => &mut self.back,
            Direction::Backward => &mut self.forward,
        };
        behind.push_front(previous);
        behind.truncate(self.capacity);
        Ok(self.current.to_step())
    }
}

#[async_trait]
impl<C: SeismogramCursor> SeismogramCursor for CachedCursor<C> {
    async fn next(&mut self) -> Result<Step, CursorError> {
        self.move_cached(Direction::Forward).await
    }

    async fn prev(&mut self) -> Result<Step, CursorError> {
        self.move_cached(Direction::Backward).await
    }

    fn beginning(&mut self) {
        self.clear();
        self.inner.beginning();
    }
}
