use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

use crate::docstore::{DocumentStoreListener, Metadata};
use crate::event_sourcing::core::EventTypeRegistry;

// ============================================================================
// Domain Event Tagging - Write interceptor
// ============================================================================
//
// Marks every document whose entity is a registered domain event with
// `Event-Store-DomainEvent: true`. The projection index filters on this
// flag, so only tagged documents are ever retrieved as events. Other
// documents pass through untouched.
//
// ============================================================================

pub const DOMAIN_EVENT_METADATA_KEY: &str = "Event-Store-DomainEvent";

pub struct DomainEventTagger {
    registry: Arc<EventTypeRegistry>,
}

impl DomainEventTagger {
    pub fn new(registry: Arc<EventTypeRegistry>) -> Self {
        Self { registry }
    }
}

impl DocumentStoreListener for DomainEventTagger {
    fn before_store(&self, key: &str, entity: &dyn Any, metadata: &mut Metadata) -> bool {
        if self.registry.is_domain_event(entity) {
            metadata.insert(DOMAIN_EVENT_METADATA_KEY.to_string(), Value::Bool(true));
            tracing::trace!(document_key = %key, "Tagged document as domain event");
        }
        true
    }
}

/// True when the metadata carries a truthy domain-event flag.
pub fn is_tagged(metadata: &Metadata) -> bool {
    match metadata.get(DOMAIN_EVENT_METADATA_KEY) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
