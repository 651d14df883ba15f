use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use super::error::{EventStoreError, EventStoreResult};
use super::projection::{INDEX_NAME, TAG_FIELD, TIMELINE_ID_FIELD, TIMESTAMP_FIELD};
use crate::docstore::{Conventions, IndexQuery, IndexValue, Query, SortedField};
use crate::event_sourcing::core::EventMapping;

// ============================================================================
// Retrieval Query Compiler
// ============================================================================
//
// One clause per event mapping, OR-combined in mapping order:
//
//   (<aggregate id field>:<id> AND Tag:<tag> AND TimeStamp:[* TO <t>]
//       AND <timeline clause>)
//
// Timeline clause:
//   primary timeline  -> TimelineId:[[NULL_VALUE]]
//   named timeline T  -> (TimelineId:[[NULL_VALUE]] OR TimelineId:T)
//
// Events on other named timelines never match. The cutoff is inclusive and
// results are sorted by TimeStamp ascending.
//
// ============================================================================

/// A retrieval query bound to the event stream projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub index_name: &'static str,
    pub index_query: IndexQuery,
}

impl CompiledQuery {
    /// Lucene-style rendering of the predicate.
    pub fn text(&self) -> String {
        self.index_query.query.to_string()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index_query.query)?;
        for sorted in &self.index_query.sorted_fields {
            write!(f, " ORDER BY {sorted}")?;
        }
        Ok(())
    }
}

pub fn compile_query(
    conventions: &Conventions,
    aggregate_id: Uuid,
    point_in_time: DateTime<Utc>,
    mappings: &[EventMapping],
    timeline_id: Option<Uuid>,
) -> EventStoreResult<CompiledQuery> {
    if aggregate_id.is_nil() {
        return Err(EventStoreError::invalid_argument(
            "aggregate_id",
            "must not be the nil uuid",
        ));
    }

    let query = if mappings.is_empty() {
        Query::MatchNone
    } else {
        Query::Or(
            mappings
                .iter()
                .map(|mapping| {
                    Query::And(vec![
                        Query::term(mapping.aggregate_id_field(), aggregate_id),
                        Query::term(
                            TAG_FIELD,
                            conventions.find_type_tag_name(mapping.type_token()),
                        ),
                        Query::at_most(TIMESTAMP_FIELD, IndexValue::Instant(point_in_time)),
                        timeline_clause(timeline_id),
                    ])
                })
                .collect(),
        )
    };

    Ok(CompiledQuery {
        index_name: INDEX_NAME,
        index_query: IndexQuery::new(query).sorted_by(SortedField::ascending(TIMESTAMP_FIELD)),
    })
}

fn timeline_clause(timeline_id: Option<Uuid>) -> Query {
    match timeline_id {
        None => Query::is_null(TIMELINE_ID_FIELD),
        Some(timeline_id) => Query::Or(vec![
            Query::is_null(TIMELINE_ID_FIELD),
            Query::term(TIMELINE_ID_FIELD, timeline_id),
        ]),
    }
}
