use super::locks::AccountLocks;
use crate::domain::account::{Account, AccountDraft, AccountId, NewAccount, TargetCredentials};
use crate::domain::batch::LedgerBatch;
use crate::domain::ports::{CredentialHasherRef, LedgerStoreRef};
use crate::error::{LedgerError, Result};
use std::sync::Arc;

/// Creates, finds and removes accounts.
///
/// Cloning is cheap; clones share the store, the hasher and the lock table.
#[derive(Clone)]
pub struct AccountRegistry {
    store: LedgerStoreRef,
    hasher: CredentialHasherRef,
    locks: Arc<AccountLocks>,
}

impl AccountRegistry {
    pub fn new(store: LedgerStoreRef, hasher: CredentialHasherRef, locks: Arc<AccountLocks>) -> Self {
        Self {
            store,
            hasher,
            locks,
        }
    }

    /// Registers a new account holding `initial_balance`.
    pub async fn create(&self, request: NewAccount) -> Result<AccountId> {
        let balance = request.validate()?;
        let draft = AccountDraft {
            credential_hash: self.hasher.hash(&request.credential),
            username: request.username,
            gov_id: request.gov_id,
            balance,
        };
        let account = self.store.insert_account(draft).await?;
        Ok(account.id)
    }

    /// Returns the lowest-id account with this username whose credential
    /// verifies, or `None`.
    pub async fn find_by_credentials(&self, username: &str, credential: &str) -> Result<Option<Account>> {
        let mut candidates = self.store.find_by_username(username).await?;
        candidates.sort_by_key(|a| a.id);
        Ok(candidates
            .into_iter()
            .find(|a| self.hasher.verify(credential, &a.credential_hash)))
    }

    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>> {
        self.store.get_account(id).await
    }

    /// Three-factor lookup: username, credential and gov_id must all match
    /// the same account.
    pub async fn find_by_target(&self, target: &TargetCredentials) -> Result<Option<Account>> {
        let Some(account) = self.store.find_by_gov_id(&target.gov_id).await? else {
            return Ok(None);
        };
        if account.username == target.username
            && self.hasher.verify(&target.credential, &account.credential_hash)
        {
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }

    /// Removes an account and its transaction history. The balance must
    /// already be zero; use `TransactionEngine::close_and_transfer` to move
    /// funds out first.
    pub async fn delete(&self, id: AccountId) -> Result<()> {
        let _guard = self.locks.acquire(&[id]).await?;
        let account = self
            .store
            .get_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        if !account.balance.is_zero() {
            return Err(LedgerError::BalanceNotZero {
                balance: account.balance.value(),
            });
        }
        self.store.commit(LedgerBatch::new().delete_account(id)).await?;
        self.locks.forget(id);
        Ok(())
    }
}
