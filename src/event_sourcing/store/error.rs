use uuid::Uuid;

use crate::docstore::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Event Store Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// A required argument was missing or invalid
    #[error("Invalid argument `{parameter}`: {reason}")]
    InvalidArgument {
        parameter: &'static str,
        reason: String,
    },

    /// The underlying document store failed
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// A stored event document could not be turned back into an event
    #[error("Data integrity violation in document {document_key} (type token {type_token:?}): {reason}")]
    DataIntegrity {
        document_key: String,
        type_token: Option<String>,
        reason: String,
    },

    /// The event was saved but the dispatcher rejected it
    #[error("Event {event_id} saved but dispatch failed: {reason}")]
    Dispatch { event_id: Uuid, reason: String },

    /// Retrieved history could not be replayed into the aggregate
    #[error("Failed to rehydrate aggregate {aggregate_id}: {reason}")]
    Rehydration { aggregate_id: Uuid, reason: String },
}

impl EventStoreError {
    pub fn invalid_argument(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }

    /// Name of the offending parameter for `InvalidArgument`.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { parameter, .. } => Some(parameter),
            _ => None,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Persistence(_) => "persistence",
            Self::DataIntegrity { .. } => "data_integrity",
            Self::Dispatch { .. } => "dispatch",
            Self::Rehydration { .. } => "rehydration",
        }
    }
}

impl IsTransient for EventStoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.is_transient())
    }
}

pub type EventStoreResult<T> = Result<T, EventStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_store_is_transient() {
        let offline = EventStoreError::from(StoreError::Unavailable("down".into()));
        let missing = EventStoreError::from(StoreError::IndexNotFound("X".into()));
        let bad_arg = EventStoreError::invalid_argument("aggregate_id", "nil");

        assert!(offline.is_transient());
        assert!(!missing.is_transient());
        assert!(!bad_arg.is_transient());
    }

    #[test]
    fn test_parameter_and_kind() {
        let err = EventStoreError::invalid_argument("document_store", "required");

        assert_eq!(err.parameter(), Some("document_store"));
        assert_eq!(err.kind(), "invalid_argument");
        assert_eq!(err.to_string(), "Invalid argument `document_store`: required");
    }
}
