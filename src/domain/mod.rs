// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain-specific events and aggregates. Each aggregate has its own
// subdirectory with:
// - Events
// - Errors
// - Aggregate implementation
// - Read models stored next to the events
//
// This layer is completely separate from the event sourcing infrastructure.
//
// ============================================================================

pub mod account;
