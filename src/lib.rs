// ============================================================================
// Timeline Event Store
// ============================================================================
//
// Event-sourced persistence over a document store, with point-in-time and
// alternate-timeline retrieval of an aggregate's history.
//
//   docstore        document store seam + in-memory implementation
//   event_sourcing  events, aggregates, tagging, projection, retrieval
//   domain          bank account sample domain
//   config          environment-driven settings
//   metrics         Prometheus metrics + HTTP exporter
//   utils           caller-level retry
//
// ============================================================================

pub mod config;
pub mod docstore;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod utils;

pub use config::EventStoreConfig;
pub use docstore::{DocumentSession, DocumentStore, InMemoryDocumentStore};
pub use event_sourcing::{
    Aggregate, BroadcastDispatcher, DomainEvent, EventDispatcher, EventMapping, EventStore,
    EventStoreError, EventStoreResult, EventTypeRegistry,
};
pub use metrics::Metrics;
