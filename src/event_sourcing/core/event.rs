use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use uuid::Uuid;

use crate::docstore::{short_type_name, Conventions};

// ============================================================================
// Domain Event Trait
// ============================================================================
//
// An immutable record of something that happened to an aggregate. Events of
// different concrete types travel together through retrieval, so the trait
// is object-safe and concrete types are recovered with `downcast_ref`.
//
// Concrete event types serialize with PascalCase field names so the stored
// document carries `Id`, `TimelineId` and `TimeStamp`.
//
// ============================================================================

/// Access to `&dyn Any` for any `'static` type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub trait DomainEvent: AsAny + fmt::Debug + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// `None` means the primary timeline.
    fn timeline_id(&self) -> Option<Uuid>;

    fn timestamp(&self) -> DateTime<Utc>;

    /// Short type name, used in logs and metric labels.
    fn event_type(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

impl dyn DomainEvent {
    pub fn downcast_ref<T: DomainEvent + 'static>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn is<T: DomainEvent + 'static>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }
}

// ============================================================================
// Event Mapping (descriptor)
// ============================================================================

/// Binds an event type to the name of the field holding its aggregate id.
///
/// Different event types may name that field differently, so retrieval
/// never assumes a uniform `AggregateId` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMapping {
    type_token: &'static str,
    aggregate_id_field: String,
}

impl EventMapping {
    pub fn new<E: DomainEvent + 'static>(aggregate_id_field: impl Into<String>) -> Self {
        Self {
            type_token: Conventions::type_token::<E>(),
            aggregate_id_field: aggregate_id_field.into(),
        }
    }

    /// Type-identity token of the mapped event type.
    pub fn type_token(&self) -> &'static str {
        self.type_token
    }

    pub fn aggregate_id_field(&self) -> &str {
        &self.aggregate_id_field
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pinged {
        id: Uuid,
        at: DateTime<Utc>,
    }

    impl DomainEvent for Pinged {
        fn id(&self) -> Uuid {
            self.id
        }

        fn timeline_id(&self) -> Option<Uuid> {
            None
        }

        fn timestamp(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[derive(Debug)]
    struct Ponged;

    impl DomainEvent for Ponged {
        fn id(&self) -> Uuid {
            Uuid::nil()
        }

        fn timeline_id(&self) -> Option<Uuid> {
            None
        }

        fn timestamp(&self) -> DateTime<Utc> {
            DateTime::<Utc>::MIN_UTC
        }
    }

    #[test]
    fn test_boxed_event_downcasts_to_concrete_type() {
        let id = Uuid::new_v4();
        let event: Box<dyn DomainEvent> = Box::new(Pinged { id, at: Utc::now() });

        assert!(event.is::<Pinged>());
        assert!(!event.is::<Ponged>());
        assert_eq!(event.downcast_ref::<Pinged>().map(|p| p.id), Some(id));
        assert!(event.downcast_ref::<Ponged>().is_none());
    }

    #[test]
    fn test_event_type_is_short_name() {
        let event: Box<dyn DomainEvent> = Box::new(Ponged);
        assert_eq!(event.event_type(), "Ponged");
    }

    #[test]
    fn test_event_mapping_records_type_token() {
        let mapping = EventMapping::new::<Pinged>("PingerId");

        assert_eq!(mapping.type_token(), Conventions::type_token::<Pinged>());
        assert_eq!(mapping.aggregate_id_field(), "PingerId");
    }
}
