use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use tokio::sync::RwLock;

use super::conventions::{Conventions, Metadata, ENTITY_NAME_KEY, TYPE_TOKEN_KEY};
use super::error::{StoreError, StoreResult};
use super::index::{IndexDefinition, IndexEntry};
use super::query::IndexQuery;
use super::{
    DocumentSession, DocumentStore, DocumentStoreListener, QueryHeader, QueryStream,
    StoredDocument,
};

// ============================================================================
// In-Memory Document Store
// ============================================================================
//
// Holds documents, metadata and index entries in process memory.
// Indexes are updated inside `save_changes`, so queries never observe a
// stale projection. Documents keep a write sequence (etag) used to break
// ties between equal sort keys.
//
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    conventions: Conventions,
    state: RwLock<State>,
    listeners: std::sync::RwLock<Vec<Arc<dyn DocumentStoreListener>>>,
    next_identity: AtomicU64,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct State {
    last_etag: u64,
    documents: HashMap<String, Slot>,
    indexes: HashMap<String, IndexState>,
}

struct Slot {
    etag: u64,
    document: StoredDocument,
}

struct IndexState {
    definition: IndexDefinition,
    entries: HashMap<String, IndexEntry>,
}

impl State {
    fn write(&mut self, document: StoredDocument) {
        self.last_etag += 1;

        for index in self.indexes.values_mut() {
            match index.definition.project(&document) {
                Some(entry) => {
                    index.entries.insert(document.key.clone(), entry);
                }
                None => {
                    index.entries.remove(&document.key);
                }
            }
        }

        self.documents.insert(
            document.key.clone(),
            Slot {
                etag: self.last_etag,
                document,
            },
        );
    }
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conventions(conventions: Conventions) -> Self {
        Self {
            inner: Arc::new(Inner {
                conventions,
                ..Default::default()
            }),
        }
    }

    /// Makes every subsequent read and commit fail with
    /// `StoreError::Unavailable` until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Writes a document exactly as given, bypassing sessions and listeners.
    pub async fn insert_raw(&self, document: StoredDocument) {
        self.inner.state.write().await.write(document);
    }

    pub async fn document_count(&self) -> usize {
        self.inner.state.read().await.documents.len()
    }

    /// Current entries of an index, in write order.
    pub async fn index_entries(&self, index_name: &str) -> StoreResult<Vec<(String, IndexEntry)>> {
        let state = self.inner.state.read().await;
        let index = state
            .indexes
            .get(index_name)
            .ok_or_else(|| StoreError::IndexNotFound(index_name.to_string()))?;

        let mut entries: Vec<(u64, String, IndexEntry)> = index
            .entries
            .iter()
            .map(|(key, entry)| {
                let etag = state.documents.get(key).map_or(0, |slot| slot.etag);
                (etag, key.clone(), entry.clone())
            })
            .collect();
        entries.sort_by_key(|(etag, _, _)| *etag);

        Ok(entries.into_iter().map(|(_, key, entry)| (key, entry)).collect())
    }

    fn ensure_available(&self) -> StoreResult<()> {
        self.inner.ensure_available()
    }
}

impl Inner {
    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched offline".to_string(),
            ));
        }
        Ok(())
    }

    fn listeners(&self) -> Vec<Arc<dyn DocumentStoreListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    type Session = InMemorySession;

    fn conventions(&self) -> &Conventions {
        &self.inner.conventions
    }

    fn register_listener(&self, listener: Arc<dyn DocumentStoreListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    async fn execute_index(&self, definition: IndexDefinition) -> StoreResult<()> {
        self.ensure_available()?;

        let mut state = self.inner.state.write().await;
        let entries = state
            .documents
            .values()
            .filter_map(|slot| {
                definition
                    .project(&slot.document)
                    .map(|entry| (slot.document.key.clone(), entry))
            })
            .collect::<HashMap<_, _>>();

        tracing::debug!(
            index = %definition.name,
            entry_count = entries.len(),
            "Index definition executed"
        );

        state
            .indexes
            .insert(definition.name.clone(), IndexState { definition, entries });
        Ok(())
    }

    fn open_session(&self) -> InMemorySession {
        InMemorySession {
            inner: self.inner.clone(),
            pending: Vec::new(),
        }
    }

    async fn stream_query(
        &self,
        index_name: &str,
        query: &IndexQuery,
    ) -> StoreResult<QueryStream> {
        self.ensure_available()?;

        let state = self.inner.state.read().await;
        let index = state
            .indexes
            .get(index_name)
            .ok_or_else(|| StoreError::IndexNotFound(index_name.to_string()))?;

        let mut hits: Vec<(&IndexEntry, &Slot)> = index
            .entries
            .iter()
            .filter(|(_, entry)| query.query.matches(entry))
            .filter_map(|(key, entry)| state.documents.get(key).map(|slot| (entry, slot)))
            .collect();
        hits.sort_by(|(a, a_slot), (b, b_slot)| {
            query.compare(a, b).then(a_slot.etag.cmp(&b_slot.etag))
        });

        let documents: Vec<StoredDocument> =
            hits.into_iter().map(|(_, slot)| slot.document.clone()).collect();

        let header = QueryHeader {
            index_name: index_name.to_string(),
            total_results: documents.len(),
        };

        Ok(QueryStream {
            header,
            documents: stream::iter(documents.into_iter().map(Ok)).boxed(),
        })
    }
}

/// Session over an `InMemoryDocumentStore`; writes are buffered until
/// `save_changes`.
pub struct InMemorySession {
    inner: Arc<Inner>,
    pending: Vec<StoredDocument>,
}

impl InMemorySession {
    fn next_key(&self, entity_name: &str) -> String {
        let n = self.inner.next_identity.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}/{}", entity_name.to_lowercase(), n)
    }
}

#[async_trait]
impl DocumentSession for InMemorySession {
    fn store<T>(&mut self, entity: &T) -> StoreResult<String>
    where
        T: Serialize + Any + Send + Sync,
    {
        let body = serde_json::to_value(entity)?;
        let type_token = Conventions::type_token::<T>();
        let entity_name = self.inner.conventions.find_type_tag_name(type_token);
        let key = self
            .inner
            .conventions
            .document_key(&body)
            .unwrap_or_else(|| self.next_key(&entity_name));

        let mut metadata = Metadata::new();
        metadata.insert(TYPE_TOKEN_KEY.to_string(), Value::from(type_token));
        metadata.insert(ENTITY_NAME_KEY.to_string(), Value::from(entity_name));

        let instance: &dyn Any = entity;
        for listener in self.inner.listeners() {
            if !listener.before_store(&key, instance, &mut metadata) {
                return Err(StoreError::WriteRejected { key });
            }
        }

        self.pending.push(StoredDocument {
            key: key.clone(),
            body,
            metadata,
        });
        Ok(key)
    }

    async fn query<T>(&mut self) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.inner.ensure_available()?;

        let type_token = Conventions::type_token::<T>();
        let state = self.inner.state.read().await;

        let mut slots: Vec<&Slot> = state
            .documents
            .values()
            .filter(|slot| slot.document.type_token() == Some(type_token))
            .collect();
        slots.sort_by_key(|slot| slot.etag);

        slots
            .into_iter()
            .map(|slot| serde_json::from_value(slot.document.body.clone()).map_err(StoreError::from))
            .collect()
    }

    async fn save_changes(&mut self) -> StoreResult<()> {
        self.inner.ensure_available()?;

        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(());
        }

        let mut state = self.inner.state.write().await;
        let count = pending.len();
        for document in pending {
            state.write(document);
        }

        tracing::trace!(document_count = count, "Session changes saved");
        Ok(())
    }
}
