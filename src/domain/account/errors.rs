use uuid::Uuid;

// ============================================================================
// Account Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Account history must start with AccountOpened, found {0}")]
    NotOpened(&'static str),

    #[error("Account {0} is already opened")]
    AlreadyOpened(Uuid),

    #[error("Event {event_type} belongs to account {found}, expected {expected}")]
    ForeignEvent {
        event_type: &'static str,
        expected: Uuid,
        found: Uuid,
    },

    #[error("Unexpected event type: {0}")]
    UnexpectedEvent(&'static str),
}
