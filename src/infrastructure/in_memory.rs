use crate::domain::account::{Account, AccountDraft, AccountId};
use crate::domain::batch::{LedgerBatch, LedgerWrite};
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::{Transaction, TransactionId, TransactionKind, newest_first};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
    gov_ids: HashMap<String, AccountId>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
    last_account_id: u64,
    last_transaction_id: u64,
}

impl LedgerState {
    /// Rejects the batch before anything is mutated if any write refers to an
    /// account that is missing or deleted earlier in the same batch.
    fn check(&self, batch: &LedgerBatch) -> Result<()> {
        let mut deleted = HashSet::new();
        for write in batch.writes() {
            let id = match write {
                LedgerWrite::SetBalance { account, .. } => *account,
                LedgerWrite::Append(tx) => tx.account_id,
                LedgerWrite::DeleteAccount(account) => *account,
            };
            if deleted.contains(&id) || !self.accounts.contains_key(&id) {
                return Err(LedgerError::AccountNotFound(id));
            }
            if let LedgerWrite::DeleteAccount(account) = write {
                deleted.insert(*account);
            }
        }
        Ok(())
    }

    fn apply(&mut self, write: LedgerWrite) {
        match write {
            LedgerWrite::SetBalance { account, balance } => {
                if let Some(acc) = self.accounts.get_mut(&account) {
                    acc.balance = balance;
                }
            }
            LedgerWrite::Append(pending) => {
                self.last_transaction_id += 1;
                let tx = pending.into_transaction(TransactionId(self.last_transaction_id));
                self.transactions.entry(tx.account_id).or_default().push(tx);
            }
            LedgerWrite::DeleteAccount(account) => {
                if let Some(acc) = self.accounts.remove(&account) {
                    self.gov_ids.remove(&acc.gov_id);
                }
                self.transactions.remove(&account);
            }
        }
    }
}

/// A thread-safe in-memory ledger store.
///
/// All state lives behind one `Arc<RwLock<..>>`, so a batch is applied under a
/// single write guard and no reader can observe it half done. Cloning shares
/// the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account(&self, draft: AccountDraft) -> Result<Account> {
        let mut state = self.state.write().await;
        if state.gov_ids.contains_key(&draft.gov_id) {
            return Err(LedgerError::DuplicateIdentifier {
                gov_id: draft.gov_id,
            });
        }
        state.last_account_id += 1;
        let account = draft.into_account(AccountId(state.last_account_id));
        state.gov_ids.insert(account.gov_id.clone(), account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .filter(|a| a.username == username)
            .cloned()
            .collect())
    }

    async fn find_by_gov_id(&self, gov_id: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .gov_ids
            .get(gov_id)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<()> {
        let mut state = self.state.write().await;
        state.check(&batch)?;
        for write in batch.into_writes() {
            state.apply(write);
        }
        Ok(())
    }

    async fn recent_transactions(
        &self,
        account: AccountId,
        kind: TransactionKind,
        limit: usize,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut matching: Vec<Transaction> = state
            .transactions
            .get(&account)
            .into_iter()
            .flatten()
            .filter(|tx| tx.kind == kind)
            .cloned()
            .collect();
        matching.sort_by(newest_first);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }
}
