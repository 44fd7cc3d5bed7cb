use super::account::{AccountId, Balance};
use super::transaction::PendingTransaction;

/// A single write inside a [`LedgerBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerWrite {
    SetBalance { account: AccountId, balance: Balance },
    Append(PendingTransaction),
    /// Removes the account together with all of its transactions.
    DeleteAccount(AccountId),
}

/// An atomic unit of work against the ledger store.
///
/// A batch is built while the engine holds the account locks and is handed to
/// `LedgerStore::commit` exactly once. Stores apply every write or none; a
/// batch that is dropped before commit leaves no trace.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "a batch has no effect until it is committed"]
pub struct LedgerBatch {
    writes: Vec<LedgerWrite>,
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(mut self, account: AccountId, balance: Balance) -> Self {
        self.writes.push(LedgerWrite::SetBalance { account, balance });
        self
    }

    pub fn append(mut self, tx: PendingTransaction) -> Self {
        self.writes.push(LedgerWrite::Append(tx));
        self
    }

    pub fn delete_account(mut self, account: AccountId) -> Self {
        self.writes.push(LedgerWrite::DeleteAccount(account));
        self
    }

    pub fn writes(&self) -> &[LedgerWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<LedgerWrite> {
        self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Accounts the batch expects to exist when it is applied.
    pub fn touched_accounts(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self
            .writes
            .iter()
            .map(|w| match w {
                LedgerWrite::SetBalance { account, .. } => *account,
                LedgerWrite::Append(tx) => tx.account_id,
                LedgerWrite::DeleteAccount(account) => *account,
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
