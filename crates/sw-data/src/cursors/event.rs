//! Leveled cursor over an event catalog

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashSet;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sw_core::{CursorPosition, Event};
use tracing::{debug, info};

use crate::config::EventQuery;
use crate::sources::{EventSource, NoDataExt};
use crate::{Capability, CursorError};

/// How a queried catalog is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPaging {
    /// One request for the whole query
    #[default]
    Single,
    /// Consecutive time-boxed requests, fetched as the cursor runs off the loaded end
    Stepped { step: Duration },
}

/// Where the events come from
pub enum EventInput {
    Catalog(Vec<Event>),
    /// JSON catalog: an array of events or an object with an `events` array
    File(PathBuf),
    Query {
        source: Arc<dyn EventSource>,
        query: EventQuery,
        paging: EventPaging,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Bare(Vec<Event>),
    Wrapped { events: Vec<Event> },
}

impl CatalogFile {
    fn into_events(self) -> Vec<Event> {
        match self {
            CatalogFile::Bare(events) | CatalogFile::Wrapped { events } => events,
        }
    }
}

/// Remaining time range of a stepped query
struct Pager {
    source: Arc<dyn EventSource>,
    query: EventQuery,
    step: Duration,
    next_start: DateTime<Utc>,
    end: DateTime<Utc>,
    seen: AHashSet<String>,
}

impl Pager {
    fn exhausted(&self) -> bool {
        self.next_start >= self.end
    }

    /// Fetch pages until one yields events not seen before, or the range runs out
    async fn fetch_page(&mut self) -> Result<Vec<Event>, CursorError> {
        while !self.exhausted() {
            // A step running past the representable range covers the rest of it
            let page_end = self
                .next_start
                .checked_add_signed(self.step)
                .map_or(self.end, |t| t.min(self.end));
            let query = EventQuery {
                start: Some(self.next_start),
                end: Some(page_end),
                ..self.query.clone()
            };
            debug!(
                "Fetching events {} .. {} from {}",
                self.next_start,
                page_end,
                self.source.source_name()
            );
            let mut events = self
                .source
                .fetch_events(&query)
                .await
                .empty_on_no_data()
                .map_err(|e| {
                    CursorError::fetch(
                        Capability::Events,
                        format!("{} .. {}", self.next_start, page_end),
                        e,
                    )
                })?;
            self.next_start = page_end;

            // Page bounds are inclusive on both sides
            events.retain(|e| self.seen.insert(e.id.clone()));
            if !events.is_empty() {
                sort_by_origin_time(&mut events);
                return Ok(events);
            }
        }
        Ok(Vec::new())
    }
}

fn sort_by_origin_time(events: &mut [Event]) {
    events.sort_by_key(|e| e.origin_time());
}

/// Walks events in origin time order, one per step
///
/// A stepped query loads its first page on the first `next()` and each
/// following page when `next()` would otherwise run past the loaded events.
/// Loaded events never change, so positions stay valid as pages are appended.
pub struct EventCursor {
    events: Vec<Arc<Event>>,
    position: CursorPosition,
    pager: Option<Pager>,
}

impl EventCursor {
    pub async fn new(input: EventInput) -> Result<Self, CursorError> {
        match input {
            EventInput::Catalog(events) => Ok(Self::from_events(events)),
            EventInput::File(path) => {
                let events = tokio::task::spawn_blocking(move || -> Result<Vec<Event>, CursorError> {
                    let reader = BufReader::new(File::open(&path)?);
                    let catalog: CatalogFile = serde_json::from_reader(reader)?;
                    Ok(catalog.into_events())
                })
                .await??;
                info!("Loaded {} events from catalog file", events.len());
                Ok(Self::from_events(events))
            }
            EventInput::Query {
                source,
                query,
                paging: EventPaging::Single,
            } => {
                query.validate().map_err(CursorError::Config)?;
                let query = query.with_defaults();
                debug!("Fetching events from {}", source.source_name());
                let events = source
                    .fetch_events(&query)
                    .await
                    .empty_on_no_data()
                    .map_err(|e| CursorError::fetch(Capability::Events, source.source_name(), e))?;
                info!("Fetched {} events from {}", events.len(), source.source_name());
                Ok(Self::from_events(events))
            }
            EventInput::Query {
                source,
                query,
                paging: EventPaging::Stepped { step },
            } => {
                query.validate().map_err(CursorError::Config)?;
                let (Some(start), Some(end)) = (query.start, query.end) else {
                    return Err(CursorError::Config(
                        "paged event query needs both start and end".to_string(),
                    ));
                };
                if step <= Duration::zero() {
                    return Err(CursorError::Config(format!(
                    "event page step must be positive, got {}",
                    step
                )));
                }
                Ok(Self {
                    events: Vec::new(),
                    position: CursorPosition::BeforeStart,
                    pager: Some(Pager {
                        source,
                        query: query.with_defaults(),
                        step,
                        next_start: start,
                        end,
                        seen: AHashSet::new(),
                    }),
                })
            }
        }
    }

    pub fn from_events(mut events: Vec<Event>) -> Self {
        sort_by_origin_time(&mut events);
        Self {
            events: events.into_iter().map(Arc::new).collect(),
            position: CursorPosition::BeforeStart,
            pager: None,
        }
    }

    /// Append the next page, returning how many events it added
    async fn load_page(&mut self) -> Result<usize, CursorError> {
        let Some(pager) = self.pager.as_mut() else {
            return Ok(0);
        };
        if pager.exhausted() {
            return Ok(0);
        }
        let page = pager.fetch_page().await?;
        debug!("Event page added {} events", page.len());
        let added = page.len();
        self.events.extend(page.into_iter().map(Arc::new));
        Ok(added)
    }

    fn current(&self) -> Option<Arc<Event>> {
        self.position.index().map(|idx| self.events[idx].clone())
    }

    pub async fn next(&mut self) -> Result<Option<Arc<Event>>, CursorError> {
        if self.position != CursorPosition::PastEnd
            && self.position.next_in(self.events.len()) == CursorPosition::PastEnd
        {
            self.load_page().await?;
        }
        self.position = self.position.next_in(self.events.len());
        Ok(self.current())
    }

    pub fn prev(&mut self) -> Option<Arc<Event>> {
        self.position = self.position.prev_in(self.events.len());
        self.current()
    }

    pub fn beginning(&mut self) {
        self.position = CursorPosition::BeforeStart;
    }

    /// Move past the last event, loading any remaining pages first
    pub async fn ending(&mut self) -> Result<(), CursorError> {
        while self.pager.as_ref().is_some_and(|p| !p.exhausted()) {
            self.load_page().await?;
        }
        self.position = CursorPosition::PastEnd;
        Ok(())
    }

    /// Number of events loaded so far
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn position(&self) -> CursorPosition {
        self.position
    }

    pub fn set_position(&mut self, position: CursorPosition) {
        self.position = match position {
            CursorPosition::At(idx) if idx >= self.events.len() => CursorPosition::PastEnd,
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursors::testing::{event_at, t0, MockEvents};

    async fn ids(cursor: &mut EventCursor) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(event) = cursor.next().await.unwrap() {
            ids.push(event.id.clone());
        }
        ids
    }

    #[tokio::test]
    async fn test_catalog_sorted_by_origin_time() {
        let events = vec![event_at("b", 60), event_at("a", 0), event_at("c", 120)];
        let mut cursor = EventCursor::from_events(events);
        assert_eq!(ids(&mut cursor).await, vec!["a", "b", "c"]);
        assert_eq!(cursor.position(), CursorPosition::PastEnd);
        assert!(cursor.next().await.unwrap().is_none());

        assert_eq!(cursor.prev().unwrap().id, "c");
        assert_eq!(cursor.prev().unwrap().id, "b");
        assert_eq!(cursor.prev().unwrap().id, "a");
        assert!(cursor.prev().is_none());
        assert!(cursor.prev().is_none());
        assert_eq!(cursor.next().await.unwrap().unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_no_data_is_empty_catalog() {
        let source = MockEvents::new(vec![]);
        let mut cursor = EventCursor::new(EventInput::Query {
            source: source.clone(),
            query: EventQuery::default(),
            paging: EventPaging::Single,
        })
        .await
        .unwrap();
        assert!(cursor.is_empty());
        assert!(cursor.next().await.unwrap().is_none());
        assert!(cursor.prev().is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_single_query_failure() {
        let source = MockEvents::new(vec![event_at("a", 0)]);
        source.fail_next(1);
        let result = EventCursor::new(EventInput::Query {
            source,
            query: EventQuery::default(),
            paging: EventPaging::Single,
        })
        .await;
        assert!(matches!(
            result,
            Err(CursorError::Fetch {
                capability: Capability::Events,
                ..
            })
        ));
    }

    fn paged(source: Arc<MockEvents>, hours: i64) -> EventInput {
        EventInput::Query {
            source,
            query: EventQuery {
                start: Some(t0()),
                end: Some(t0() + Duration::hours(hours)),
                ..Default::default()
            },
            paging: EventPaging::Stepped { step: Duration::hours(1) },
        }
    }

    #[tokio::test]
    async fn test_pages_fetched_lazily() {
        // Nothing in the second hour; one event exactly on the 3h boundary
        let source = MockEvents::new(vec![
            event_at("a", 60),
            event_at("b", 120),
            event_at("c", 3 * 3600),
            event_at("d", 3 * 3600 + 60),
        ]);
        let mut cursor = EventCursor::new(paged(source.clone(), 4)).await.unwrap();
        assert_eq!(source.calls(), 0);

        assert_eq!(cursor.next().await.unwrap().unwrap().id, "a");
        assert_eq!(source.calls(), 1);
        assert_eq!(cursor.next().await.unwrap().unwrap().id, "b");
        assert_eq!(source.calls(), 1);

        assert_eq!(cursor.next().await.unwrap().unwrap().id, "c");
        assert_eq!(source.calls(), 3);
        assert_eq!(cursor.next().await.unwrap().unwrap().id, "d");
        assert!(cursor.next().await.unwrap().is_none());
        assert_eq!(cursor.len(), 4);

        assert_eq!(cursor.prev().unwrap().id, "d");
    }

    #[tokio::test]
    async fn test_failed_page_keeps_position() {
        let source = MockEvents::new(vec![event_at("a", 60), event_at("b", 3600 + 60)]);
        let mut cursor = EventCursor::new(paged(source.clone(), 2)).await.unwrap();
        assert_eq!(cursor.next().await.unwrap().unwrap().id, "a");

        source.fail_next(1);
        assert!(cursor.next().await.is_err());
        assert_eq!(cursor.position(), CursorPosition::At(0));

        assert_eq!(cursor.next().await.unwrap().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_ending_loads_remaining_pages() {
        let source = MockEvents::new(vec![event_at("a", 60), event_at("b", 3600 + 60)]);
        let mut cursor = EventCursor::new(paged(source, 2)).await.unwrap();
        cursor.ending().await.unwrap();
        assert_eq!(cursor.prev().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_paging_needs_bounds() {
        let input = EventInput::Query {
            source: MockEvents::new(vec![]),
            query: EventQuery::default(),
            paging: EventPaging::Stepped { step: Duration::days(30) },
        };
        assert!(matches!(EventCursor::new(input).await, Err(CursorError::Config(_))));

        let source = MockEvents::new(vec![]);
        let mut input = paged(source, 2);
        if let EventInput::Query { paging, .. } = &mut input {
            *paging = EventPaging::Stepped { step: Duration::zero() };
        }
        assert!(matches!(EventCursor::new(input).await, Err(CursorError::Config(_))));
    }

    #[tokio::test]
    async fn test_malformed_query_rejected() {
        let source = MockEvents::new(vec![event_at("a", 0)]);
        let query = EventQuery {
            min_latitude: Some(40.0),
            max_latitude: Some(30.0),
            ..Default::default()
        };
        for paging in [EventPaging::Single, EventPaging::Stepped { step: Duration::hours(1) }] {
            let input = EventInput::Query {
                source: source.clone(),
                query: EventQuery {
                    start: Some(t0()),
                    end: Some(t0() + Duration::hours(2)),
                    ..query.clone()
                },
                paging,
            };
            assert!(matches!(EventCursor::new(input).await, Err(CursorError::Config(_))));
        }
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_step_beyond_representable_time() {
        let source = MockEvents::new(vec![event_at("a", 60), event_at("b", 3600 + 60)]);
        let mut input = paged(source.clone(), 2);
        if let EventInput::Query { paging, .. } = &mut input {
            *paging = EventPaging::Stepped { step: Duration::days(100_000_000) };
        }
        let mut cursor = EventCursor::new(input).await.unwrap();
        assert_eq!(cursor.next().await.unwrap().unwrap().id, "a");
        assert_eq!(cursor.next().await.unwrap().unwrap().id, "b");
        assert!(cursor.next().await.unwrap().is_none());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_catalog_file_forms() {
        let dir = tempfile::tempdir().unwrap();
        let events = vec![event_at("late", 60), event_at("early", 0)];

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, serde_json::to_string(&events).unwrap()).unwrap();
        let mut cursor = EventCursor::new(EventInput::File(bare)).await.unwrap();
        assert_eq!(ids(&mut cursor).await, vec!["early", "late"]);

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&wrapped, serde_json::json!({ "events": events }).to_string()).unwrap();
        let cursor = EventCursor::new(EventInput::File(wrapped)).await.unwrap();
        assert_eq!(cursor.len(), 2);

        let missing = dir.path().join("missing.json");
        assert!(matches!(EventCursor::new(EventInput::File(missing)).await, Err(CursorError::Io(_))));
    }
}
