use super::locks::AccountLocks;
use super::registry::AccountRegistry;
use crate::domain::account::{AccountId, Amount, Balance, TargetCredentials};
use crate::domain::batch::LedgerBatch;
use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{PendingTransaction, TransactionKind};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Outcome of a successful account closure.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureReceipt {
    pub closed: AccountId,
    pub target: AccountId,
    pub transferred: Balance,
    pub target_balance: Balance,
}

/// Applies deposits, withdrawals and account closures.
///
/// Every operation validates its input, takes the locks of the accounts it
/// touches, re-reads them, and commits a single [`LedgerBatch`]. Returning
/// early at any point drops the batch, so a rejected operation leaves the
/// store untouched.
#[derive(Clone)]
pub struct TransactionEngine {
    store: LedgerStoreRef,
    registry: AccountRegistry,
    locks: Arc<AccountLocks>,
}

impl TransactionEngine {
    pub fn new(store: LedgerStoreRef, registry: AccountRegistry, locks: Arc<AccountLocks>) -> Self {
        Self {
            store,
            registry,
            locks,
        }
    }

    /// Adds `amount` to the account and records a Deposit.
    pub async fn deposit(&self, account: AccountId, amount: Decimal) -> Result<Balance> {
        self.apply(account, amount, TransactionKind::Deposit).await
    }

    /// Removes `amount` from the account and records a Withdraw. Fails with
    /// `InsufficientFunds` when the balance does not cover it.
    pub async fn withdraw(&self, account: AccountId, amount: Decimal) -> Result<Balance> {
        self.apply(account, amount, TransactionKind::Withdraw).await
    }

    async fn apply(&self, id: AccountId, amount: Decimal, kind: TransactionKind) -> Result<Balance> {
        let amount = Amount::new(amount)?;
        let _guard = self.locks.acquire(&[id]).await?;

        let mut account = self
            .store
            .get_account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let balance = match kind {
            TransactionKind::Deposit => account.deposit(amount)?,
            TransactionKind::Withdraw => account.withdraw(amount)?,
        };

        let batch = LedgerBatch::new()
            .set_balance(id, balance)
            .append(PendingTransaction::now(id, amount, kind));
        self.store.commit(batch).await?;
        Ok(balance)
    }

    /// Moves the whole balance of `source` into the account identified by
    /// `target`, then deletes `source` and its history.
    ///
    /// The target must match on username, credential and gov_id. Closing an
    /// account into itself is rejected.
    pub async fn close_and_transfer(
        &self,
        source: AccountId,
        target: &TargetCredentials,
    ) -> Result<ClosureReceipt> {
        let target_id = self
            .registry
            .find_by_target(target)
            .await?
            .ok_or(LedgerError::TargetNotFound)?
            .id;
        if target_id == source {
            return Err(LedgerError::SelfTransferNotAllowed);
        }

        let _guard = self.locks.acquire(&[source, target_id]).await?;

        // Either side may have changed or vanished while we waited.
        let source_account = self
            .store
            .get_account(source)
            .await?
            .ok_or(LedgerError::AccountNotFound(source))?;
        let target_account = self
            .store
            .get_account(target_id)
            .await?
            .ok_or(LedgerError::TargetNotFound)?;

        let transferred = source_account.balance;
        let target_balance = target_account.balance.checked_add(transferred)?;

        let batch = LedgerBatch::new()
            .set_balance(target_id, target_balance)
            .delete_account(source);
        self.store.commit(batch).await?;
        self.locks.forget(source);

        Ok(ClosureReceipt {
            closed: source,
            target: target_id,
            transferred,
            target_balance,
        })
    }
}
