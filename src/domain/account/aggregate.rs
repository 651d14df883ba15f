use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::AccountError;
use super::events::*;
use crate::event_sourcing::core::{Aggregate, DomainEvent, EventMapping};

// ============================================================================
// BankAccount Aggregate - State derived from account events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BankAccount {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current State (derived from events)
    pub owner: String,
    pub balance: i64,

    // Audit Trail
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BankAccount {
    fn ensure_owned(&self, event_type: &'static str, account_id: Uuid) -> Result<(), AccountError> {
        if account_id != self.id {
            return Err(AccountError::ForeignEvent {
                event_type,
                expected: self.id,
                found: account_id,
            });
        }
        Ok(())
    }
}

impl Aggregate for BankAccount {
    type Error = AccountError;

    fn event_mappings() -> Vec<EventMapping> {
        vec![
            EventMapping::new::<AccountOpened>("AccountId"),
            EventMapping::new::<Deposited>("AccountId"),
            EventMapping::new::<Withdrawn>("AccountId"),
            EventMapping::new::<TransferReceived>("DestinationAccountId"),
        ]
    }

    fn apply_first_event(event: &dyn DomainEvent) -> Result<Self, Self::Error> {
        let opened = event
            .downcast_ref::<AccountOpened>()
            .ok_or(AccountError::NotOpened(event.event_type()))?;

        Ok(Self {
            id: opened.account_id,
            version: 1,
            owner: opened.owner.clone(),
            balance: 0,
            opened_at: opened.time_stamp,
            updated_at: opened.time_stamp,
        })
    }

    fn apply_event(&mut self, event: &dyn DomainEvent) -> Result<(), Self::Error> {
        if let Some(e) = event.downcast_ref::<Deposited>() {
            self.ensure_owned(event.event_type(), e.account_id)?;
            self.balance += e.amount;
        } else if let Some(e) = event.downcast_ref::<Withdrawn>() {
            self.ensure_owned(event.event_type(), e.account_id)?;
            self.balance -= e.amount;
        } else if let Some(e) = event.downcast_ref::<TransferReceived>() {
            self.ensure_owned(event.event_type(), e.destination_account_id)?;
            self.balance += e.amount;
        } else if event.is::<AccountOpened>() {
            return Err(AccountError::AlreadyOpened(self.id));
        } else {
            return Err(AccountError::UnexpectedEvent(event.event_type()));
        }

        self.version += 1;
        self.updated_at = event.timestamp();
        Ok(())
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_balance_from_history() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let events: Vec<Box<dyn DomainEvent>> = vec![
            Box::new(AccountOpened::new(id, "Ada", t(0))),
            Box::new(Deposited::new(id, 1_000, t(1))),
            Box::new(Withdrawn::new(id, 250, t(2))),
            Box::new(TransferReceived::new(id, other, 500, t(3))),
        ];

        let account = BankAccount::load_from_events(&events).unwrap().unwrap();

        assert_eq!(account.balance, 1_250);
        assert_eq!(account.version(), 4);
        assert_eq!(account.owner, "Ada");
        assert_eq!(account.updated_at, t(3));
    }

    #[test]
    fn test_history_must_start_with_opening() {
        let id = Uuid::new_v4();
        let events: Vec<Box<dyn DomainEvent>> = vec![Box::new(Deposited::new(id, 10, t(0)))];

        let err = BankAccount::load_from_events(&events).unwrap_err();
        assert!(matches!(err, AccountError::NotOpened("Deposited")));
    }

    #[test]
    fn test_rejects_second_opening_and_foreign_events() {
        let id = Uuid::new_v4();
        let mut account = BankAccount::apply_first_event(&AccountOpened::new(id, "Ada", t(0))).unwrap();

        let reopened = account.apply_event(&AccountOpened::new(id, "Ada", t(1)));
        assert!(matches!(reopened, Err(AccountError::AlreadyOpened(_))));

        let foreign = account.apply_event(&Deposited::new(Uuid::new_v4(), 5, t(2)));
        assert!(matches!(foreign, Err(AccountError::ForeignEvent { .. })));
        assert_eq!(account.balance, 0);
    }

    #[test]
    fn test_mappings_cover_every_event_type() {
        let mappings = BankAccount::event_mappings();
        assert_eq!(mappings.len(), 4);
        assert_eq!(mappings[3].aggregate_id_field(), "DestinationAccountId");
    }
}
