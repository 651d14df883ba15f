// ============================================================================
// Account Domain - Bank account history
// ============================================================================
//
// This module contains ALL Account-specific code:
// - Events (AccountOpened, Deposited, Withdrawn, TransferReceived)
// - Errors (AccountError enum)
// - Aggregate (BankAccount, rebuilt from events as of any instant)
// - Read model (AccountSummary, a plain document that is not an event)
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod summary;

// Re-export for convenience
pub use aggregate::*;
pub use errors::*;
pub use events::*;
pub use summary::*;

use crate::event_sourcing::core::EventTypeRegistry;

/// Registry of every account event type.
pub fn account_registry() -> EventTypeRegistry {
    EventTypeRegistry::new()
        .register::<AccountOpened>()
        .register::<Deposited>()
        .register::<Withdrawn>()
        .register::<TransferReceived>()
}
