use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use super::event::DomainEvent;
use crate::docstore::Conventions;

// ============================================================================
// Event Type Registry
// ============================================================================
//
// Closed set of concrete event types known to the store. It answers two
// questions:
// 1. Is this entity a domain event? (tagging on write)
// 2. Which concrete type does this stored type token name? (materializing)
//
// Legacy tokens can be aliased to a current type so documents written under
// an older type name still resolve.
//
// ============================================================================

/// Rebuilds a concrete event from its stored JSON body.
pub type EventDeserializer = fn(Value) -> Result<Box<dyn DomainEvent>, serde_json::Error>;

fn deserialize_boxed<E>(body: Value) -> Result<Box<dyn DomainEvent>, serde_json::Error>
where
    E: DomainEvent + DeserializeOwned + 'static,
{
    let event: E = serde_json::from_value(body)?;
    Ok(Box::new(event))
}

#[derive(Debug, Clone, Default)]
pub struct EventTypeRegistry {
    type_ids: HashSet<TypeId>,
    deserializers: HashMap<String, EventDeserializer>,
}

impl EventTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E>(mut self) -> Self
    where
        E: DomainEvent + DeserializeOwned + 'static,
    {
        self.type_ids.insert(TypeId::of::<E>());
        self.deserializers.insert(
            Conventions::type_token::<E>().to_string(),
            deserialize_boxed::<E>,
        );
        self
    }

    /// Resolves `legacy_token` to `E` when materializing.
    pub fn register_alias<E>(mut self, legacy_token: impl Into<String>) -> Self
    where
        E: DomainEvent + DeserializeOwned + 'static,
    {
        self.deserializers
            .insert(legacy_token.into(), deserialize_boxed::<E>);
        self
    }

    pub fn is_registered<E: 'static>(&self) -> bool {
        self.type_ids.contains(&TypeId::of::<E>())
    }

    /// True when the runtime type of `entity` is a registered event type.
    pub fn is_domain_event(&self, entity: &dyn Any) -> bool {
        self.type_ids.contains(&Any::type_id(entity))
    }

    pub fn resolve(&self, type_token: &str) -> Option<EventDeserializer> {
        self.deserializers.get(type_token).copied()
    }

    pub fn len(&self) -> usize {
        self.type_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.type_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Renamed {
        id: Uuid,
        time_stamp: DateTime<Utc>,
    }

    impl DomainEvent for Renamed {
        fn id(&self) -> Uuid {
            self.id
        }

        fn timeline_id(&self) -> Option<Uuid> {
            None
        }

        fn timestamp(&self) -> DateTime<Utc> {
            self.time_stamp
        }
    }

    #[derive(Debug, Serialize)]
    struct NotAnEvent;

    #[test]
    fn test_membership_uses_runtime_type() {
        let registry = EventTypeRegistry::new().register::<Renamed>();
        let event = Renamed {
            id: Uuid::new_v4(),
            time_stamp: Utc::now(),
        };

        assert!(registry.is_registered::<Renamed>());
        assert!(!registry.is_registered::<NotAnEvent>());
        assert!(registry.is_domain_event(&event));
        assert!(!registry.is_domain_event(&NotAnEvent));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_current_and_legacy_tokens() {
        let registry = EventTypeRegistry::new()
            .register::<Renamed>()
            .register_alias::<Renamed>("Legacy.Events.Renamed, Legacy");

        let id = Uuid::new_v4();
        let body = json!({"Id": id, "TimeStamp": "2024-03-01T10:00:00Z"});

        let current = registry
            .resolve(Conventions::type_token::<Renamed>())
            .unwrap();
        let legacy = registry.resolve("Legacy.Events.Renamed, Legacy").unwrap();

        assert_eq!(current(body.clone()).unwrap().id(), id);
        assert_eq!(legacy(body).unwrap().id(), id);
        assert!(registry.resolve("Unknown").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = EventTypeRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_domain_event(&NotAnEvent));
    }
}
