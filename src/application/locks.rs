use crate::domain::account::AccountId;
use crate::error::{LedgerError, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-account mutual exclusion for engine operations.
///
/// Each account gets its own async mutex. Multi-account operations take their
/// locks in ascending id order, so two operations over the same pair of
/// accounts can never wait on each other in a cycle. Every wait is bounded by
/// the configured timeout and surfaces as [`LedgerError::LockTimeout`].
pub struct AccountLocks {
    table: DashMap<AccountId, Arc<AsyncMutex<()>>>,
    timeout: Duration,
}

/// Holds the locks of one operation; they are released on drop.
#[must_use = "the locks are released as soon as the guard is dropped"]
pub struct AccountGuard {
    accounts: Vec<AccountId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl AccountGuard {
    /// The locked accounts, in acquisition order.
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }
}

impl AccountLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            table: DashMap::new(),
            timeout,
        }
    }

    fn handle(&self, id: AccountId) -> Arc<AsyncMutex<()>> {
        Arc::clone(&self.table.entry(id).or_default())
    }

    pub async fn acquire(&self, ids: &[AccountId]) -> Result<AccountGuard> {
        let mut accounts = ids.to_vec();
        accounts.sort();
        accounts.dedup();

        let mut guards = Vec::with_capacity(accounts.len());
        for &id in &accounts {
            let lock = self.handle(id).lock_owned();
            let guard = tokio::time::timeout(self.timeout, lock)
                .await
                .map_err(|_| LedgerError::LockTimeout { account: id })?;
            guards.push(guard);
        }

        Ok(AccountGuard {
            accounts,
            _guards: guards,
        })
    }

    /// Drops the table entry of a deleted account. Ids are never reused, so a
    /// late waiter on the old mutex only finds the account gone.
    pub fn forget(&self, id: AccountId) {
        self.table.remove(&id);
    }

    pub fn tracked(&self) -> usize {
        self.table.len()
    }
}
