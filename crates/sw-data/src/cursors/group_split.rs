//! Splits each visit into one visit per instrument

use ahash::RandomState;
use async_trait::async_trait;
use indexmap::IndexMap;
use sw_core::{CursorPosition, Direction, Step, Visit, WaveformBundle};
use tracing::trace;

use super::SeismogramCursor;
use crate::CursorError;

/// Group traces by band and instrument code, in order of first appearance
///
/// `HHZ`, `HHN` and `HHE` share a group; `HNZ` starts another.
pub fn split_by_instrument(bundle: &WaveformBundle) -> Vec<WaveformBundle> {
    let mut groups: IndexMap<(Option<char>, Option<char>), WaveformBundle, RandomState> = IndexMap::default();
    for trace in bundle.iter() {
        groups.entry(trace.id.band_instrument()).or_default().traces.push(trace.clone());
    }
    groups.into_values().collect()
}

/// Exposes each instrument group of the wrapped cursor's visits as its own step
///
/// A visit with no traces becomes exactly one step with an empty bundle.
pub struct GroupSplitCursor<C> {
    inner: C,
    pair: Option<Visit>,
    groups: Vec<WaveformBundle>,
    position: CursorPosition,
}

impl<C: SeismogramCursor> GroupSplitCursor<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            pair: None,
            groups: Vec::new(),
            position: CursorPosition::BeforeStart,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn current(&self) -> Step {
        match (&self.pair, self.position.index()) {
            (Some(pair), Some(idx)) => Step::Data(pair.with_waveforms(self.groups[idx].clone())),
            _ => Step::End,
        }
    }

    async fn step_group(&mut self, direction: Direction) -> Result<Step, CursorError> {
        if self.pair.is_some() {
            let target = self.position.step_in(direction, self.groups.len());
            if !target.is_sentinel() {
                self.position = target;
                return Ok(self.current());
            }
        }

        // Errors from the wrapped cursor leave the group position untouched
        match self.inner.step(direction).await? {
            Step::End => {
                self.pair = None;
                self.groups.clear();
                self.position = match direction {
                    Direction::Forward => CursorPosition::PastEnd,
                    Direction::Backward => CursorPosition::BeforeStart,
                };
                Ok(Step::End)
            }
            Step::Data(visit) => {
                let mut groups = split_by_instrument(&visit.waveforms);
                if groups.is_empty() {
                    groups.push(WaveformBundle::empty());
                }
                trace!("{} split into {} groups", visit.station_label(), groups.len());
                self.position = match direction {
                    Direction::Forward => CursorPosition::At(0),
                    Direction::Backward => CursorPosition::At(groups.len() - 1),
                };
                self.groups = groups;
                self.pair = Some(visit.with_waveforms(WaveformBundle::empty()));
                Ok(self.current())
            }
        }
    }
}

#[async_trait]
impl<C: SeismogramCursor> SeismogramCursor for GroupSplitCursor<C> {
    async fn next(&mut self) -> Result<Step, CursorError> {
        self.step_group(Direction::Forward).await
    }

    async fn prev(&mut self) -> Result<Step, CursorError> {
        self.step_group(Direction::Backward).await
    }

    fn beginning(&mut self) {
        self.inner.beginning();
        self.pair = None;
        self.groups.clear();
        self.position = CursorPosition::BeforeStart;
    }
}
