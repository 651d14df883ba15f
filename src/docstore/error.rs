// ============================================================================
// Document Store Errors
// ============================================================================

/// Errors raised by a document store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Write of document {key} rejected by listener")]
    WriteRejected { key: String },
}

impl StoreError {
    /// Transient failures may succeed when the same call is repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
