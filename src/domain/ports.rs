use super::account::{Account, AccountDraft, AccountId};
use super::batch::LedgerBatch;
use super::transaction::{Transaction, TransactionKind};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable storage of accounts and their transaction log.
///
/// Implementations must apply each [`LedgerBatch`] atomically and must check
/// `gov_id` uniqueness and insert an account as one indivisible step.
/// Serializing concurrent operations on the same account is the engine's job
/// (see `AccountLocks`), not the store's.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persists a new account and returns it with its assigned id.
    /// Fails with `DuplicateIdentifier` if the gov_id is already taken.
    async fn insert_account(&self, draft: AccountDraft) -> Result<Account>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>>;

    async fn find_by_username(&self, username: &str) -> Result<Vec<Account>>;

    async fn find_by_gov_id(&self, gov_id: &str) -> Result<Option<Account>>;

    /// Applies every write of the batch or none of them. Fails with
    /// `AccountNotFound` if an account the batch touches does not exist.
    async fn commit(&self, batch: LedgerBatch) -> Result<()>;

    /// Transactions of one kind for an account, most recent first.
    async fn recent_transactions(
        &self,
        account: AccountId,
        kind: TransactionKind,
        limit: usize,
    ) -> Result<Vec<Transaction>>;

    /// All accounts ordered by id.
    async fn all_accounts(&self) -> Result<Vec<Account>>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;

/// Produces and checks credential hashes. The ledger treats the hash as opaque.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, credential: &str) -> String;
    fn verify(&self, credential: &str, hash: &str) -> bool;
}

pub type CredentialHasherRef = Arc<dyn CredentialHasher>;
