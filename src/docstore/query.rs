use std::cmp::Ordering;
use std::fmt;

use super::index::{IndexEntry, IndexValue};

// ============================================================================
// Index Queries - Predicate tree + sort directive
// ============================================================================
//
// Queries are built as a tree and evaluated against index entries. The tree
// renders to Lucene-style text, which is what gets logged and what tests pin.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    MatchNone,
    /// Exact match on the term form of a stored field
    Term { field: String, value: String },
    /// Field absent or null
    IsNull { field: String },
    /// Inclusive range; `None` leaves that end open
    Range {
        field: String,
        lower: Option<IndexValue>,
        upper: Option<IndexValue>,
    },
    /// Full-text match of one token in an analyzed field
    Search { field: String, term: String },
    And(Vec<Query>),
    Or(Vec<Query>),
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl ToString) -> Self {
        Query::Term {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Query::IsNull {
            field: field.into(),
        }
    }

    pub fn at_most(field: impl Into<String>, upper: IndexValue) -> Self {
        Query::Range {
            field: field.into(),
            lower: None,
            upper: Some(upper),
        }
    }

    pub fn search(field: impl Into<String>, term: impl Into<String>) -> Self {
        Query::Search {
            field: field.into(),
            term: term.into(),
        }
    }

    /// Evaluates the predicate against one index entry.
    pub fn matches(&self, entry: &IndexEntry) -> bool {
        match self {
            Query::MatchAll => true,
            Query::MatchNone => false,
            Query::Term { field, value } => entry
                .field(field)
                .filter(|f| f.stored)
                .and_then(|f| f.value.term())
                .is_some_and(|term| term == *value),
            Query::IsNull { field } => entry.value(field).is_null(),
            Query::Range { field, lower, upper } => {
                let value = entry.value(field);
                if value.is_null() {
                    return false;
                }
                let above_lower = lower.as_ref().map_or(true, |l| {
                    matches!(
                        value.compare_same_kind(l),
                        Some(Ordering::Greater | Ordering::Equal)
                    )
                });
                let below_upper = upper.as_ref().map_or(true, |u| {
                    matches!(
                        value.compare_same_kind(u),
                        Some(Ordering::Less | Ordering::Equal)
                    )
                });
                above_lower && below_upper
            }
            Query::Search { field, term } => {
                let needle = term.to_lowercase();
                entry
                    .field(field)
                    .filter(|f| f.analyzed)
                    .is_some_and(|f| f.tokens().iter().any(|t| *t == needle))
            }
            Query::And(clauses) => clauses.iter().all(|c| c.matches(entry)),
            Query::Or(clauses) => clauses.iter().any(|c| c.matches(entry)),
        }
    }

    fn write_to(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            Query::MatchAll => write!(f, "*:*"),
            Query::MatchNone => write!(f, "-*:*"),
            Query::Term { field, value } => write!(f, "{field}:{value}"),
            Query::IsNull { field } => write!(f, "{field}:[[NULL_VALUE]]"),
            Query::Range { field, lower, upper } => {
                let bound = |b: &Option<IndexValue>| {
                    b.as_ref().map_or_else(|| "*".to_string(), |v| v.to_string())
                };
                write!(f, "{field}:[{} TO {}]", bound(lower), bound(upper))
            }
            Query::Search { field, term } => write!(f, "{field}:<<{term}>>"),
            Query::And(clauses) => {
                write!(f, "(")?;
                write_joined(f, clauses, " AND ")?;
                write!(f, ")")
            }
            Query::Or(clauses) => {
                if nested {
                    write!(f, "(")?;
                }
                write_joined(f, clauses, " OR ")?;
                if nested {
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, clauses: &[Query], separator: &str) -> fmt::Result {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        clause.write_to(f, true)?;
    }
    Ok(())
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedField {
    pub field: String,
    pub descending: bool,
}

impl SortedField {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Orders two entries by this field.
    pub fn compare(&self, a: &IndexEntry, b: &IndexEntry) -> Ordering {
        let ordering = a.value(&self.field).compare(b.value(&self.field));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl fmt::Display for SortedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.descending { '-' } else { '+' };
        write!(f, "{sign}{}", self.field)
    }
}

/// A query against a named index, with its sort directive.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub query: Query,
    pub sorted_fields: Vec<SortedField>,
}

impl IndexQuery {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            sorted_fields: Vec::new(),
        }
    }

    pub fn sorted_by(mut self, field: SortedField) -> Self {
        self.sorted_fields.push(field);
        self
    }

    /// Orders two entries by every sort field in turn.
    pub fn compare(&self, a: &IndexEntry, b: &IndexEntry) -> Ordering {
        self.sorted_fields
            .iter()
            .map(|s| s.compare(a, b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::index::IndexField;

    fn entry(fields: &[(&str, IndexValue)]) -> IndexEntry {
        let mut entry = IndexEntry::new();
        for (name, value) in fields {
            entry.insert(*name, IndexField::create(value.clone(), true, true));
        }
        entry
    }

    #[test]
    fn test_term_and_null_matching() {
        let e = entry(&[
            ("Tag", IndexValue::Text("Depositeds".into())),
            ("TimelineId", IndexValue::Null),
        ]);

        assert!(Query::term("Tag", "Depositeds").matches(&e));
        assert!(!Query::term("Tag", "Withdrawns").matches(&e));
        assert!(Query::is_null("TimelineId").matches(&e));
        assert!(Query::is_null("Missing").matches(&e));
        assert!(!Query::is_null("Tag").matches(&e));
    }

    #[test]
    fn test_range_is_inclusive() {
        let e = entry(&[("Amount", IndexValue::Number(10.0))]);

        assert!(Query::at_most("Amount", IndexValue::Number(10.0)).matches(&e));
        assert!(!Query::at_most("Amount", IndexValue::Number(9.0)).matches(&e));
        assert!(!Query::at_most("Missing", IndexValue::Number(9.0)).matches(&e));
    }

    #[test]
    fn test_range_never_matches_another_kind() {
        let cutoff = IndexValue::Instant(
            chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
        );
        let epoch = entry(&[("TimeStamp", IndexValue::Number(1_893_456_000.0))]);
        let text = entry(&[("TimeStamp", IndexValue::Text("later".into()))]);

        assert!(!Query::at_most("TimeStamp", cutoff.clone()).matches(&epoch));
        assert!(!Query::at_most("TimeStamp", cutoff).matches(&text));
    }

    #[test]
    fn test_search_uses_tokens() {
        let e = entry(&[("Memo", IndexValue::Text("Rent for March".into()))]);

        assert!(Query::search("Memo", "MARCH").matches(&e));
        assert!(!Query::search("Memo", "april").matches(&e));
    }

    #[test]
    fn test_rendering_nests_or_inside_and() {
        let query = Query::Or(vec![
            Query::And(vec![
                Query::term("A", 1),
                Query::Or(vec![Query::is_null("T"), Query::term("T", "x")]),
            ]),
            Query::And(vec![Query::term("B", 2)]),
        ]);

        assert_eq!(
            query.to_string(),
            "(A:1 AND (T:[[NULL_VALUE]] OR T:x)) OR (B:2)"
        );
        assert_eq!(Query::MatchNone.to_string(), "-*:*");
    }

    #[test]
    fn test_sort_directive() {
        let early = entry(&[("N", IndexValue::Number(1.0))]);
        let late = entry(&[("N", IndexValue::Number(2.0))]);

        let asc = IndexQuery::new(Query::MatchAll).sorted_by(SortedField::ascending("N"));
        let desc = IndexQuery::new(Query::MatchAll).sorted_by(SortedField::descending("N"));

        assert_eq!(asc.compare(&early, &late), Ordering::Less);
        assert_eq!(desc.compare(&early, &late), Ordering::Greater);
        assert_eq!(SortedField::ascending("TimeStamp").to_string(), "+TimeStamp");
    }
}
