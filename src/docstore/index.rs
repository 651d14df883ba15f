use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::conventions::Metadata;
use super::StoredDocument;

// ============================================================================
// Index Definitions - Standing projections maintained on write
// ============================================================================
//
// An index is a filter over document metadata plus a map from a document to
// an `IndexEntry`. The store keeps one entry per matching document and
// re-projects it every time the document is written.
//
// ============================================================================

/// Value of one indexed field.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    Null,
    Bool(bool),
    Number(f64),
    Instant(DateTime<Utc>),
    Text(String),
}

impl IndexValue {
    /// Converts a JSON property into an index value.
    ///
    /// Strings holding RFC 3339 instants become `Instant` so that range
    /// queries order them chronologically. Offset-less timestamps
    /// (`2024-01-01T00:00:00.0000000`) are read as UTC. Arrays and objects
    /// are indexed as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => IndexValue::Null,
            Value::Bool(b) => IndexValue::Bool(*b),
            Value::Number(n) => n
                .as_f64()
                .map(IndexValue::Number)
                .unwrap_or_else(|| IndexValue::Text(n.to_string())),
            Value::String(s) => parse_instant(s)
                .map(IndexValue::Instant)
                .unwrap_or_else(|| IndexValue::Text(s.clone())),
            other => IndexValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, IndexValue::Null)
    }

    /// Textual form compared by exact-match term queries.
    pub fn term(&self) -> Option<String> {
        match self {
            IndexValue::Null => None,
            IndexValue::Bool(b) => Some(b.to_string()),
            IndexValue::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                Some(format!("{}", *n as i64))
            }
            IndexValue::Number(n) => Some(n.to_string()),
            IndexValue::Instant(instant) => Some(format_instant(instant)),
            IndexValue::Text(s) => Some(s.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            IndexValue::Null => 0,
            IndexValue::Bool(_) => 1,
            IndexValue::Number(_) => 2,
            IndexValue::Instant(_) => 3,
            IndexValue::Text(_) => 4,
        }
    }

    /// Ordering of two values of the same kind, `None` across kinds.
    ///
    /// Range checks use this so that a bound never matches a value of
    /// another kind.
    pub fn compare_same_kind(&self, other: &IndexValue) -> Option<Ordering> {
        if self.rank() != other.rank() || self.is_null() {
            return None;
        }
        Some(self.compare(other))
    }

    /// Total order used for sorting and range checks: nulls first, then by
    /// kind, then by value within a kind.
    pub fn compare(&self, other: &IndexValue) -> Ordering {
        match (self, other) {
            (IndexValue::Bool(a), IndexValue::Bool(b)) => a.cmp(b),
            (IndexValue::Number(a), IndexValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (IndexValue::Instant(a), IndexValue::Instant(b)) => a.cmp(b),
            (IndexValue::Text(a), IndexValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term() {
            Some(term) => write!(f, "{term}"),
            None => write!(f, "[[NULL_VALUE]]"),
        }
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.with_timezone(&Utc));
    }
    s.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

/// Fixed-width instant format with seven fractional digits.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    format!(
        "{}.{:07}",
        instant.format("%Y-%m-%dT%H:%M:%S"),
        instant.timestamp_subsec_nanos() / 100
    )
}

/// One field of an index entry.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
    pub value: IndexValue,
    /// Available to exact-match and range queries
    pub stored: bool,
    /// Tokenized for full-text search
    pub analyzed: bool,
    tokens: Vec<String>,
}

impl IndexField {
    pub fn new(value: IndexValue) -> Self {
        Self::create(value, true, false)
    }

    pub fn create(value: IndexValue, stored: bool, analyzed: bool) -> Self {
        let tokens = if analyzed {
            value.term().map(|t| tokenize(&t)).unwrap_or_default()
        } else {
            Vec::new()
        };

        Self {
            value,
            stored,
            analyzed,
            tokens,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

static NULL_VALUE: IndexValue = IndexValue::Null;

/// The projection of one document into an index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexEntry {
    fields: BTreeMap<String, IndexField>,
}

impl IndexEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, field: IndexField) {
        self.fields.insert(name.into(), field);
    }

    pub fn field(&self, name: &str) -> Option<&IndexField> {
        self.fields.get(name)
    }

    /// Value of a field, `Null` when the entry does not carry it.
    pub fn value(&self, name: &str) -> &IndexValue {
        self.fields.get(name).map(|f| &f.value).unwrap_or(&NULL_VALUE)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

pub type IndexFilter = Arc<dyn Fn(&Metadata) -> bool + Send + Sync>;
pub type IndexMap = Arc<dyn Fn(&StoredDocument) -> IndexEntry + Send + Sync>;

/// A named standing index.
#[derive(Clone)]
pub struct IndexDefinition {
    pub name: String,
    filter: IndexFilter,
    map: IndexMap,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, filter: IndexFilter, map: IndexMap) -> Self {
        Self {
            name: name.into(),
            filter,
            map,
        }
    }

    /// Projects a document, or `None` when the filter excludes it.
    pub fn project(&self, document: &StoredDocument) -> Option<IndexEntry> {
        if (self.filter)(&document.metadata) {
            Some((self.map)(document))
        } else {
            None
        }
    }
}

impl fmt::Debug for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_rfc3339_strings_become_instants() {
        let value = IndexValue::from_json(&json!("2024-03-01T10:00:00Z"));
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(value, IndexValue::Instant(expected));
        assert_eq!(value.term().unwrap(), "2024-03-01T10:00:00.0000000");
    }

    #[test]
    fn test_offset_less_strings_are_utc_instants() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(
            IndexValue::from_json(&json!("2020-01-01T00:00:00")),
            IndexValue::Instant(expected)
        );
        assert_eq!(
            IndexValue::from_json(&json!("2020-01-01T00:00:00.0000000")),
            IndexValue::Instant(expected)
        );
        assert_eq!(
            IndexValue::from_json(&json!("2020-01-01")),
            IndexValue::Text("2020-01-01".to_string())
        );
    }

    #[test]
    fn test_same_kind_comparison() {
        let instant = IndexValue::Instant(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let epoch = IndexValue::Number(1_893_456_000.0);

        assert_eq!(epoch.compare_same_kind(&instant), None);
        assert_eq!(IndexValue::Null.compare_same_kind(&IndexValue::Null), None);
        assert_eq!(instant.compare_same_kind(&instant), Some(Ordering::Equal));
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(IndexValue::from_json(&json!(null)), IndexValue::Null);
        assert_eq!(IndexValue::from_json(&json!(10)).term().unwrap(), "10");
        assert_eq!(IndexValue::from_json(&json!(2.5)).term().unwrap(), "2.5");
        assert_eq!(
            IndexValue::from_json(&json!({"a": 1})),
            IndexValue::Text("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn test_ordering_puts_nulls_first() {
        let early = IndexValue::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let late = IndexValue::Instant(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

        assert_eq!(early.compare(&late), Ordering::Less);
        assert_eq!(IndexValue::Null.compare(&early), Ordering::Less);
        assert_eq!(late.compare(&late), Ordering::Equal);
    }

    #[test]
    fn test_analyzed_field_tokens() {
        let field = IndexField::create(IndexValue::Text("Rent for March".to_string()), true, true);
        assert_eq!(field.tokens(), ["rent", "for", "march"]);

        let stored_only = IndexField::new(IndexValue::Text("Rent".to_string()));
        assert!(stored_only.tokens().is_empty());
    }
}
