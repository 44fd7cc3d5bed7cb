use crate::domain::account::AccountId;
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{HistoryEntry, TransactionKind};
use crate::error::Result;

/// Read-only view over an account's transaction log.
#[derive(Clone)]
pub struct HistoryReader {
    store: LedgerStoreRef,
    default_limit: usize,
}

impl HistoryReader {
    pub fn new(store: LedgerStoreRef, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    /// Up to `limit` transactions of `kind`, most recent first. Each call runs
    /// a fresh query.
    pub async fn recent_transactions(
        &self,
        account: AccountId,
        kind: TransactionKind,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let transactions = self.store.recent_transactions(account, kind, limit).await?;
        Ok(transactions.iter().map(HistoryEntry::from).collect())
    }

    pub async fn recent(&self, account: AccountId, kind: TransactionKind) -> Result<Vec<HistoryEntry>> {
        self.recent_transactions(account, kind, self.default_limit).await
    }
}
