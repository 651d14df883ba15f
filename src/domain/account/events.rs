use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// Account Events - Domain Events for the BankAccount aggregate
// ============================================================================
//
// Amounts are in minor units (cents). `TransferReceived` names its owning
// account `DestinationAccountId`; every other event uses `AccountId`.
//
// ============================================================================

macro_rules! domain_event {
    ($event:ty) => {
        impl DomainEvent for $event {
            fn id(&self) -> Uuid {
                self.id
            }

            fn timeline_id(&self) -> Option<Uuid> {
                self.timeline_id
            }

            fn timestamp(&self) -> DateTime<Utc> {
                self.time_stamp
            }
        }

        impl $event {
            /// Moves the event onto an alternate timeline.
            pub fn on_timeline(mut self, timeline_id: Uuid) -> Self {
                self.timeline_id = Some(timeline_id);
                self
            }
        }
    };
}

/// Account Opened - Initial event in account lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AccountOpened {
    pub id: Uuid,
    pub account_id: Uuid,
    pub owner: String,
    pub timeline_id: Option<Uuid>,
    pub time_stamp: DateTime<Utc>,
}

impl AccountOpened {
    pub fn new(account_id: Uuid, owner: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            owner: owner.into(),
            timeline_id: None,
            time_stamp: at,
        }
    }
}

domain_event!(AccountOpened);

/// Deposited - Money paid into the account
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Deposited {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub timeline_id: Option<Uuid>,
    pub time_stamp: DateTime<Utc>,
}

impl Deposited {
    pub fn new(account_id: Uuid, amount: i64, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            amount,
            timeline_id: None,
            time_stamp: at,
        }
    }
}

domain_event!(Deposited);

/// Withdrawn - Money taken out of the account
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Withdrawn {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub timeline_id: Option<Uuid>,
    pub time_stamp: DateTime<Utc>,
}

impl Withdrawn {
    pub fn new(account_id: Uuid, amount: i64, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id,
            amount,
            timeline_id: None,
            time_stamp: at,
        }
    }
}

domain_event!(Withdrawn);

/// Transfer Received - Money moved in from another account
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TransferReceived {
    pub id: Uuid,
    pub destination_account_id: Uuid,
    pub source_account_id: Uuid,
    pub amount: i64,
    pub timeline_id: Option<Uuid>,
    pub time_stamp: DateTime<Utc>,
}

impl TransferReceived {
    pub fn new(
        destination_account_id: Uuid,
        source_account_id: Uuid,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            destination_account_id,
            source_account_id,
            amount,
            timeline_id: None,
            time_stamp: at,
        }
    }
}

domain_event!(TransferReceived);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_serialize_with_pascal_case_fields() {
        let account = Uuid::new_v4();
        let event = Deposited::new(account, 10, Utc::now());
        let body = serde_json::to_value(&event).unwrap();

        assert_eq!(body["Id"], json!(event.id));
        assert_eq!(body["AccountId"], json!(account));
        assert_eq!(body["Amount"], json!(10));
        assert_eq!(body["TimelineId"], json!(null));
        assert!(body.get("TimeStamp").is_some());
    }

    #[test]
    fn test_on_timeline() {
        let timeline = Uuid::new_v4();
        let event = Withdrawn::new(Uuid::new_v4(), 4, Utc::now()).on_timeline(timeline);

        assert_eq!(event.timeline_id(), Some(timeline));
        assert_eq!(event.event_type(), "Withdrawn");
    }
}
