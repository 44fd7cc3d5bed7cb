use super::account::{AccountId, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

/// Direction of a balance change. Amounts are always positive.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => f.write_str("Deposit"),
            TransactionKind::Withdraw => f.write_str("Withdraw"),
        }
    }
}

/// A log entry that has not been persisted yet; the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransaction {
    pub account_id: AccountId,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
}

impl PendingTransaction {
    pub fn now(account_id: AccountId, amount: Amount, kind: TransactionKind) -> Self {
        Self {
            account_id,
            amount,
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            amount: self.amount,
            kind: self.kind,
            timestamp: self.timestamp,
        }
    }
}

/// An immutable entry of the transaction log.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
}

/// One row of an account's history as shown to the account holder.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub amount: Amount,
}

impl From<&Transaction> for HistoryEntry {
    fn from(tx: &Transaction) -> Self {
        Self {
            timestamp: tx.timestamp,
            amount: tx.amount,
        }
    }
}

/// Orders transactions most recent first: newest timestamp, then highest id.
pub fn newest_first(a: &Transaction, b: &Transaction) -> std::cmp::Ordering {
    b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id))
}
