// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================
//
// Write path:  save -> session.store -> DomainEventTagger -> save_changes
//              -> "DomainEvents/Stream" projection -> dispatcher
// Read path:   compile_query -> StreamingMaterializer -> concrete events
//
// All components work with ANY document store and ANY registered event type.
//
// ============================================================================

pub mod error;
pub mod event_store;
pub mod materializer;
pub mod projection;
pub mod query;
pub mod tagging;

pub use error::{EventStoreError, EventStoreResult};
pub use event_store::{EventStore, EventStoreBuilder};
pub use materializer::StreamingMaterializer;
pub use projection::{DomainEventsStream, INDEX_NAME};
pub use query::{compile_query, CompiledQuery};
pub use tagging::{DomainEventTagger, DOMAIN_EVENT_METADATA_KEY};
