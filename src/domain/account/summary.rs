use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregate::BankAccount;

// ============================================================================
// Account Summary - Read model stored alongside the events
// ============================================================================
//
// A plain document sharing the store with the events. It is never tagged,
// so it stays out of the event stream projection.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AccountSummary {
    pub id: String,
    pub account_id: Uuid,
    pub owner: String,
    pub balance: i64,
}

impl AccountSummary {
    pub fn document_key(account_id: Uuid) -> String {
        format!("accountsummaries/{account_id}")
    }
}

impl From<&BankAccount> for AccountSummary {
    fn from(account: &BankAccount) -> Self {
        Self {
            id: Self::document_key(account.id),
            account_id: account.id,
            owner: account.owner.clone(),
            balance: account.balance,
        }
    }
}
