use std::fmt::Display;
use uuid::Uuid;

use super::event::{DomainEvent, EventMapping};

// ============================================================================
// Aggregate Root Pattern - Rehydration from a point in time
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Events represent facts that have already happened
// 3. Replaying the events visible at an instant yields the state at that
//    instant
//
// An aggregate names the event types that belong to it, and for each the
// field carrying its id, so the store can compile a retrieval query for it.
//
// ============================================================================

pub trait Aggregate: Sized + Send + Sync {
    type Error: Display;

    /// Event types making up this aggregate's history.
    fn event_mappings() -> Vec<EventMapping>;

    /// Create new aggregate from first event
    fn apply_first_event(event: &dyn DomainEvent) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &dyn DomainEvent) -> Result<(), Self::Error>;

    fn aggregate_id(&self) -> Uuid;

    /// Number of events applied
    fn version(&self) -> i64;

    /// Replays an ordered history. An empty history yields `None`.
    fn load_from_events(events: &[Box<dyn DomainEvent>]) -> Result<Option<Self>, Self::Error> {
        let Some((first, rest)) = events.split_first() else {
            return Ok(None);
        };

        let mut aggregate = Self::apply_first_event(&**first)?;
        for event in rest {
            aggregate.apply_event(&**event)?;
        }

        Ok(Some(aggregate))
    }
}
