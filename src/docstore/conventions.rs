use serde_json::Value;

// ============================================================================
// Document Store Conventions
// ============================================================================
//
// Naming rules shared by everything that writes or queries documents:
// - Type-identity token: the full Rust type path of a stored value
// - Type tag (entity name): short type name, pluralised
// - Document key: the value of the identity property, when present
//
// ============================================================================

/// Metadata key holding the type-identity token of a stored document.
pub const TYPE_TOKEN_KEY: &str = "Rust-Type";

/// Metadata key holding the type tag (entity name) of a stored document.
pub const ENTITY_NAME_KEY: &str = "Entity-Name";

/// Per-document metadata bag.
pub type Metadata = serde_json::Map<String, Value>;

#[derive(Debug, Clone)]
pub struct Conventions {
    identity_property: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            identity_property: "Id".to_string(),
        }
    }
}

impl Conventions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity_property(mut self, property: impl Into<String>) -> Self {
        self.identity_property = property.into();
        self
    }

    /// The type-identity token recorded for values of type `T`.
    pub fn type_token<T: ?Sized + 'static>() -> &'static str {
        std::any::type_name::<T>()
    }

    /// Maps a type-identity token to the tag used for indexing and filtering.
    pub fn find_type_tag_name(&self, type_token: &str) -> String {
        pluralize(short_type_name(type_token))
    }

    pub fn identity_property(&self) -> &str {
        &self.identity_property
    }

    /// Document key taken from the identity property of a serialized body.
    pub fn document_key(&self, body: &Value) -> Option<String> {
        match body.get(&self.identity_property)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Last path segment of a type token, without generic arguments.
pub fn short_type_name(type_token: &str) -> &str {
    let without_generics = type_token.split('<').next().unwrap_or(type_token);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

fn pluralize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        let before_vowel = stem
            .chars()
            .last()
            .map(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
            .unwrap_or(true);
        if !before_vowel {
            return format!("{stem}ies");
        }
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| name.ends_with(*suffix)) {
        return format!("{name}es");
    }

    format!("{name}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Deposited;

    #[test]
    fn test_type_token_is_full_path() {
        let token = Conventions::type_token::<Deposited>();
        assert!(token.ends_with("::Deposited"));
        assert!(token.contains("conventions"));
    }

    #[test]
    fn test_tag_name_pluralizes_short_name() {
        let conventions = Conventions::new();
        assert_eq!(conventions.find_type_tag_name("bank::events::Deposited"), "Depositeds");
        assert_eq!(conventions.find_type_tag_name("ledger::Entry"), "Entries");
        assert_eq!(conventions.find_type_tag_name("Day"), "Days");
        assert_eq!(conventions.find_type_tag_name("a::Address"), "Addresses");
        assert_eq!(conventions.find_type_tag_name("a::Wrapper<b::Inner>"), "Wrappers");
    }

    #[test]
    fn test_document_key_from_identity_property() {
        let conventions = Conventions::new();
        assert_eq!(
            conventions.document_key(&json!({"Id": "abc"})),
            Some("abc".to_string())
        );
        assert_eq!(conventions.document_key(&json!({"Id": 7})), Some("7".to_string()));
        assert_eq!(conventions.document_key(&json!({"Id": ""})), None);
        assert_eq!(conventions.document_key(&json!({"Name": "x"})), None);

        let custom = Conventions::new().with_identity_property("key");
        assert_eq!(custom.document_key(&json!({"key": "k1"})), Some("k1".to_string()));
    }
}
