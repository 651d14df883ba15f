use serde_json::Value;
use std::sync::Arc;

use super::tagging::is_tagged;
use crate::docstore::{
    IndexDefinition, IndexEntry, IndexField, IndexValue, Metadata, StoredDocument,
    ENTITY_NAME_KEY,
};

// ============================================================================
// Event Stream Projection - "DomainEvents/Stream"
// ============================================================================
//
// One standing index over every tagged event document, whatever its type.
// Each top-level property of the body becomes a field of the same name
// (stored and analyzed), so the query compiler can address "the field this
// event type calls its aggregate id" without a schema. On top of those:
//
//   Tag        -> entity name recorded by the store (type discriminator)
//   Id         -> document key
//   TimelineId -> body `TimelineId`, null when absent
//   TimeStamp  -> body `TimeStamp`
//
// ============================================================================

pub const INDEX_NAME: &str = "DomainEvents/Stream";

pub const TAG_FIELD: &str = "Tag";
pub const ID_FIELD: &str = "Id";
pub const TIMELINE_ID_FIELD: &str = "TimelineId";
pub const TIMESTAMP_FIELD: &str = "TimeStamp";

pub struct DomainEventsStream;

impl DomainEventsStream {
    pub fn definition() -> IndexDefinition {
        IndexDefinition::new(INDEX_NAME, Arc::new(Self::filter), Arc::new(Self::map))
    }

    /// Only documents tagged as domain events are indexed.
    pub fn filter(metadata: &Metadata) -> bool {
        is_tagged(metadata)
    }

    pub fn map(document: &StoredDocument) -> IndexEntry {
        let mut entry = IndexEntry::new();

        if let Value::Object(properties) = &document.body {
            for (name, value) in properties {
                entry.insert(
                    name.as_str(),
                    IndexField::create(IndexValue::from_json(value), true, true),
                );
            }
        }

        let tag = document
            .metadata
            .get(ENTITY_NAME_KEY)
            .map_or(IndexValue::Null, IndexValue::from_json);
        entry.insert(TAG_FIELD, IndexField::new(tag));
        entry.insert(
            ID_FIELD,
            IndexField::new(IndexValue::Text(document.key.clone())),
        );
        entry.insert(
            TIMELINE_ID_FIELD,
            IndexField::new(Self::body_value(document, TIMELINE_ID_FIELD)),
        );
        entry.insert(
            TIMESTAMP_FIELD,
            IndexField::new(Self::body_value(document, TIMESTAMP_FIELD)),
        );

        entry
    }

    fn body_value(document: &StoredDocument, property: &str) -> IndexValue {
        document
            .body
            .get(property)
            .map_or(IndexValue::Null, IndexValue::from_json)
    }
}
