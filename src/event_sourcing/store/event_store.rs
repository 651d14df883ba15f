use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::error::{EventStoreError, EventStoreResult};
use super::materializer::StreamingMaterializer;
use super::projection::{DomainEventsStream, TIMESTAMP_FIELD};
use super::query::compile_query;
use super::tagging::DomainEventTagger;
use crate::docstore::{DocumentSession, DocumentStore, IndexValue, StoreError};
use crate::event_sourcing::core::{
    Aggregate, DomainEvent, EventDispatcher, EventMapping, EventTypeRegistry,
};
use crate::metrics::Metrics;

// ============================================================================
// Event Store - Save, find and point-in-time retrieval
// ============================================================================
//
// Works with ANY document store implementing `DocumentStore` and ANY set of
// event types registered in the `EventTypeRegistry`.
//
// Responsibilities:
// 1. Save events (one session per call), then hand them to the dispatcher
// 2. Ad hoc typed reads of saved events
// 3. Retrieve an aggregate's history as of an instant, on a timeline
// 4. Rehydrate aggregates from that history
//
// Building the store registers the tagging listener and the
// "DomainEvents/Stream" projection with the document store.
//
// ============================================================================

pub struct EventStore<S: DocumentStore> {
    store: S,
    dispatcher: Arc<dyn EventDispatcher>,
    registry: Arc<EventTypeRegistry>,
    metrics: Option<Arc<Metrics>>,
}

pub struct EventStoreBuilder<S: DocumentStore> {
    document_store: Option<S>,
    event_dispatcher: Option<Arc<dyn EventDispatcher>>,
    registry: EventTypeRegistry,
    metrics: Option<Arc<Metrics>>,
}

impl<S: DocumentStore> EventStoreBuilder<S> {
    pub fn document_store(mut self, store: S) -> Self {
        self.document_store = Some(store);
        self
    }

    pub fn event_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.event_dispatcher = Some(dispatcher);
        self
    }

    /// Event types the store can tag and materialize. Must be complete
    /// before the first retrieval.
    pub fn registry(mut self, registry: EventTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn build(self) -> EventStoreResult<EventStore<S>> {
        let store = self
            .document_store
            .ok_or_else(|| EventStoreError::invalid_argument("document_store", "a document store is required"))?;
        let dispatcher = self
            .event_dispatcher
            .ok_or_else(|| EventStoreError::invalid_argument("event_dispatcher", "an event dispatcher is required"))?;

        let registry = Arc::new(self.registry);
        store.register_listener(Arc::new(DomainEventTagger::new(registry.clone())));
        store.execute_index(DomainEventsStream::definition()).await?;

        tracing::info!(
            registered_event_types = registry.len(),
            "✅ Event store initialized"
        );

        Ok(EventStore {
            store,
            dispatcher,
            registry,
            metrics: self.metrics,
        })
    }
}

impl<S: DocumentStore> EventStore<S> {
    pub fn builder() -> EventStoreBuilder<S> {
        EventStoreBuilder {
            document_store: None,
            event_dispatcher: None,
            registry: EventTypeRegistry::new(),
            metrics: None,
        }
    }

    pub fn document_store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &EventTypeRegistry {
        &self.registry
    }

    /// Persists one event and dispatches it once the write has committed.
    ///
    /// A dispatch failure is reported as `Dispatch`; the event stays saved.
    pub async fn save<E>(&self, event: E) -> EventStoreResult<()>
    where
        E: DomainEvent + Serialize,
    {
        let result = self.save_inner(event).await;
        self.observe("save", result)
    }

    async fn save_inner<E>(&self, event: E) -> EventStoreResult<()>
    where
        E: DomainEvent + Serialize,
    {
        if !self.registry.is_registered::<E>() {
            return Err(EventStoreError::invalid_argument(
                "event",
                format!("{} is not a registered event type", event.event_type()),
            ));
        }

        // A TimeStamp that does not index as an instant can never satisfy a
        // point-in-time cut, so the event would drop out of every history.
        let body = serde_json::to_value(&event).map_err(StoreError::from)?;
        if !matches!(
            body.get(TIMESTAMP_FIELD).map(IndexValue::from_json),
            Some(IndexValue::Instant(_))
        ) {
            return Err(EventStoreError::invalid_argument(
                "event",
                format!(
                    "{} must serialize {TIMESTAMP_FIELD} as an ISO 8601 instant",
                    event.event_type()
                ),
            ));
        }

        let mut session = self.store.open_session();
        let document_key = session.store(&event)?;
        session.save_changes().await?;

        let event_id = event.id();
        let event_type = event.event_type();

        tracing::info!(
            event_id = %event_id,
            event_type = event_type,
            document_key = %document_key,
            timeline_id = ?event.timeline_id(),
            "✅ Saved domain event"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_saved(event_type);
        }

        self.dispatcher
            .dispatch(Arc::new(event))
            .await
            .map_err(|e| EventStoreError::Dispatch {
                event_id,
                reason: format!("{e:#}"),
            })
    }

    /// All saved events of type `T` matching `predicate`, in write order.
    pub async fn find<T, P>(&self, predicate: P) -> EventStoreResult<Vec<T>>
    where
        T: DomainEvent + DeserializeOwned,
        P: Fn(&T) -> bool + Send,
    {
        let mut session = self.store.open_session();
        let result = session
            .query::<T>()
            .await
            .map(|all| all.into_iter().filter(|e| predicate(e)).collect())
            .map_err(EventStoreError::from);
        self.observe("find", result)
    }

    /// Events of the mapped types owned by `aggregate_id` that existed at
    /// `point_in_time` (inclusive) on `timeline_id`, ascending by timestamp.
    ///
    /// `None` selects the primary timeline. A named timeline also sees every
    /// primary-timeline event.
    pub async fn retrieve_events(
        &self,
        aggregate_id: Uuid,
        point_in_time: DateTime<Utc>,
        mappings: &[EventMapping],
        timeline_id: Option<Uuid>,
    ) -> EventStoreResult<Vec<Box<dyn DomainEvent>>> {
        let started = Instant::now();
        let result = self
            .retrieve_inner(aggregate_id, point_in_time, mappings, timeline_id)
            .await;

        if let (Ok(events), Some(metrics)) = (&result, &self.metrics) {
            metrics.record_retrieval(events.len(), started.elapsed().as_secs_f64());
        }
        self.observe("retrieve", result)
    }

    async fn retrieve_inner(
        &self,
        aggregate_id: Uuid,
        point_in_time: DateTime<Utc>,
        mappings: &[EventMapping],
        timeline_id: Option<Uuid>,
    ) -> EventStoreResult<Vec<Box<dyn DomainEvent>>> {
        let compiled = compile_query(
            self.store.conventions(),
            aggregate_id,
            point_in_time,
            mappings,
            timeline_id,
        )?;

        tracing::debug!(
            aggregate_id = %aggregate_id,
            index = compiled.index_name,
            query = %compiled,
            "Compiled retrieval query"
        );

        let events = StreamingMaterializer::new(&self.store, &self.registry)
            .execute(&compiled)
            .await?;

        tracing::debug!(
            aggregate_id = %aggregate_id,
            point_in_time = %point_in_time,
            timeline_id = ?timeline_id,
            event_count = events.len(),
            "Retrieved events"
        );

        Ok(events)
    }

    /// State of aggregate `A` as of `point_in_time` on `timeline_id`, or
    /// `None` when it has no history there yet.
    pub async fn load_aggregate<A: Aggregate>(
        &self,
        aggregate_id: Uuid,
        point_in_time: DateTime<Utc>,
        timeline_id: Option<Uuid>,
    ) -> EventStoreResult<Option<A>> {
        let events = self
            .retrieve_events(aggregate_id, point_in_time, &A::event_mappings(), timeline_id)
            .await?;

        let result = A::load_from_events(&events).map_err(|e| EventStoreError::Rehydration {
            aggregate_id,
            reason: e.to_string(),
        });
        self.observe("load_aggregate", result)
    }

    fn observe<T>(&self, operation: &'static str, result: EventStoreResult<T>) -> EventStoreResult<T> {
        if let (Err(e), Some(metrics)) = (&result, &self.metrics) {
            metrics.record_failure(operation, e.kind());
        }
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
