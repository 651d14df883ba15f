// ============================================================================
// Document Store - Session, listener and streaming-query contracts
// ============================================================================
//
// The event store persists into a document store it does not own. This
// module names the capabilities it relies on:
// - Sessions (unit of work): store, typed query, save changes
// - Write listeners that can annotate document metadata
// - Standing index definitions maintained by the store
// - Forward-only streaming queries over an index, with a sort directive
//
// `InMemoryDocumentStore` implements all of them in-process.
//
// ============================================================================

mod conventions;
mod error;
mod index;
mod memory;
mod query;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

pub use conventions::{
    short_type_name, Conventions, Metadata, ENTITY_NAME_KEY, TYPE_TOKEN_KEY,
};
pub use error::{StoreError, StoreResult};
pub use index::{format_instant, IndexDefinition, IndexEntry, IndexField, IndexValue};
pub use memory::{InMemoryDocumentStore, InMemorySession};
pub use query::{IndexQuery, Query, SortedField};

/// A document as held by the store: key, JSON body and metadata bag.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub body: Value,
    pub metadata: Metadata,
}

impl StoredDocument {
    /// Type-identity token recorded when the document was stored.
    pub fn type_token(&self) -> Option<&str> {
        self.metadata.get(TYPE_TOKEN_KEY).and_then(Value::as_str)
    }
}

/// Hook invoked for every document immediately before it is written.
pub trait DocumentStoreListener: Send + Sync {
    /// Returning `false` vetoes the write.
    fn before_store(&self, key: &str, entity: &dyn Any, metadata: &mut Metadata) -> bool;
}

/// Header returned alongside a streaming query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryHeader {
    pub index_name: String,
    /// Result-count hint
    pub total_results: usize,
}

pub type DocumentStream = BoxStream<'static, StoreResult<StoredDocument>>;

/// Forward-only cursor over the documents matched by an index query.
pub struct QueryStream {
    pub header: QueryHeader,
    pub documents: DocumentStream,
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    type Session: DocumentSession;

    fn conventions(&self) -> &Conventions;

    fn register_listener(&self, listener: Arc<dyn DocumentStoreListener>);

    /// Creates or replaces a standing index. Re-executing the same definition
    /// is a no-op apart from a rebuild.
    async fn execute_index(&self, definition: IndexDefinition) -> StoreResult<()>;

    fn open_session(&self) -> Self::Session;

    async fn stream_query(&self, index_name: &str, query: &IndexQuery)
        -> StoreResult<QueryStream>;
}

/// Unit of work against a document store.
#[async_trait]
pub trait DocumentSession: Send {
    /// Queues an entity for writing and returns its document key. Write
    /// listeners run here.
    fn store<T>(&mut self, entity: &T) -> StoreResult<String>
    where
        T: Serialize + Any + Send + Sync;

    /// All stored documents whose type-identity token is `T`'s.
    async fn query<T>(&mut self) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static;

    /// Commits queued writes.
    async fn save_changes(&mut self) -> StoreResult<()>;
}
