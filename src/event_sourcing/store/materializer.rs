use futures_util::StreamExt;

use super::error::{EventStoreError, EventStoreResult};
use super::query::CompiledQuery;
use crate::docstore::{DocumentStore, StoredDocument};
use crate::event_sourcing::core::{DomainEvent, EventTypeRegistry};

// ============================================================================
// Streaming Materializer
// ============================================================================
//
// Runs a compiled query as a forward-only stream over the projection and
// rebuilds each hit as its concrete event type. The type is taken from the
// document's own type-identity token, never from the projection's Tag.
//
// Any element that cannot be rebuilt fails the whole call: a history with a
// gap in it is worse than no history.
//
// ============================================================================

/// Upper bound on the capacity reserved from a result-count hint.
const MAX_PREALLOCATED_EVENTS: usize = 1024;

pub struct StreamingMaterializer<'a, S: DocumentStore> {
    store: &'a S,
    registry: &'a EventTypeRegistry,
}

impl<'a, S: DocumentStore> StreamingMaterializer<'a, S> {
    pub fn new(store: &'a S, registry: &'a EventTypeRegistry) -> Self {
        Self { store, registry }
    }

    pub async fn execute(&self, query: &CompiledQuery) -> EventStoreResult<Vec<Box<dyn DomainEvent>>> {
        let mut stream = self
            .store
            .stream_query(query.index_name, &query.index_query)
            .await?;

        let capacity = stream.header.total_results.min(MAX_PREALLOCATED_EVENTS);
        let mut events = Vec::with_capacity(capacity);
        while let Some(document) = stream.documents.next().await {
            events.push(self.materialize(document?)?);
        }

        tracing::trace!(
            index = %stream.header.index_name,
            event_count = events.len(),
            "Materialized event stream"
        );
        Ok(events)
    }

    fn materialize(&self, document: StoredDocument) -> EventStoreResult<Box<dyn DomainEvent>> {
        let Some(type_token) = document.type_token().map(str::to_string) else {
            return Err(EventStoreError::DataIntegrity {
                document_key: document.key,
                type_token: None,
                reason: "document metadata carries no type-identity token".to_string(),
            });
        };

        let Some(deserialize) = self.registry.resolve(&type_token) else {
            return Err(EventStoreError::DataIntegrity {
                document_key: document.key,
                type_token: Some(type_token),
                reason: "type-identity token is not a registered event type".to_string(),
            });
        };

        deserialize(document.body).map_err(|e| EventStoreError::DataIntegrity {
            document_key: document.key,
            type_token: Some(type_token),
            reason: format!("body does not deserialize into the recorded type: {e}"),
        })
    }
}
