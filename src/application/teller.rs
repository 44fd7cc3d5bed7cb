use super::engine::ClosureReceipt;
use super::ledger::Ledger;
use super::session::{SessionRegistry, SessionToken};
use crate::domain::account::{AccountId, Balance, NewAccount, TargetCredentials};
use crate::domain::transaction::{HistoryEntry, TransactionKind};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;

/// What the account holder sees on the teller screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub balance: Balance,
    pub deposits: Vec<HistoryEntry>,
    pub withdrawals: Vec<HistoryEntry>,
}

/// Session-aware entry point for a teller front end.
///
/// Resolves a [`SessionToken`] to an account and forwards to the ledger. The
/// ledger itself never sees tokens.
#[derive(Clone)]
pub struct Teller {
    ledger: Ledger,
    sessions: SessionRegistry,
}

impl Teller {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn register(&self, request: NewAccount) -> Result<AccountId> {
        self.ledger.registry.create(request).await
    }

    /// Opens a session, or returns `None` when the credentials match nothing.
    pub async fn login(&self, username: &str, credential: &str) -> Result<Option<SessionToken>> {
        match self.ledger.registry.find_by_credentials(username, credential).await? {
            Some(account) => Ok(Some(self.sessions.open(account.id).await)),
            None => Ok(None),
        }
    }

    pub async fn logout(&self, token: &SessionToken) -> bool {
        self.sessions.end(token).await
    }

    pub async fn balance(&self, token: &SessionToken) -> Result<Balance> {
        let id = self.sessions.resolve(token).await?;
        let account = self
            .ledger
            .registry
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        Ok(account.balance)
    }

    pub async fn deposit(&self, token: &SessionToken, amount: Decimal) -> Result<Balance> {
        let id = self.sessions.resolve(token).await?;
        self.ledger.engine.deposit(id, amount).await
    }

    pub async fn withdraw(&self, token: &SessionToken, amount: Decimal) -> Result<Balance> {
        let id = self.sessions.resolve(token).await?;
        self.ledger.engine.withdraw(id, amount).await
    }

    /// Balance plus the most recent deposits and withdrawals.
    pub async fn statement(&self, token: &SessionToken) -> Result<Statement> {
        let id = self.sessions.resolve(token).await?;
        let balance = self.balance(token).await?;
        let history = &self.ledger.history;
        Ok(Statement {
            balance,
            deposits: history.recent(id, TransactionKind::Deposit).await?,
            withdrawals: history.recent(id, TransactionKind::Withdraw).await?,
        })
    }

    /// Closes the session's account into `target` and ends all of its sessions.
    pub async fn close_account(
        &self,
        token: &SessionToken,
        target: &TargetCredentials,
    ) -> Result<ClosureReceipt> {
        let id = self.sessions.resolve(token).await?;
        let receipt = self.ledger.engine.close_and_transfer(id, target).await?;
        self.sessions.end_all_for(id).await;
        Ok(receipt)
    }
}
