// ============================================================================
// Event Sourcing Core - Generic Infrastructure Abstractions
// ============================================================================
//
// Key Principles:
// - No domain-specific code (no Account, Deposit, etc.)
// - Events are addressed through the object-safe `DomainEvent` trait
// - Concrete event types are recovered through the `EventTypeRegistry`
//
// ============================================================================

pub mod aggregate;
pub mod dispatcher;
pub mod event;
pub mod registry;

// Re-export core types for convenience
pub use aggregate::Aggregate;
pub use dispatcher::{BroadcastDispatcher, EventDispatcher};
pub use event::{AsAny, DomainEvent, EventMapping};
pub use registry::{EventDeserializer, EventTypeRegistry};
