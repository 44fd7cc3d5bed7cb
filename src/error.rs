use crate::domain::account::AccountId;
use miette::Diagnostic;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Broad family of a [`LedgerError`], used by callers to decide presentation
/// and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-supplied data violates a precondition.
    Input,
    /// An expected business outcome.
    Domain,
    /// A transient storage fault; the whole atomic unit was aborted.
    Store,
}

#[derive(Error, Diagnostic, Debug)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    #[diagnostic(code(ledger::invalid_input))]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    #[diagnostic(code(ledger::csv))]
    Csv(#[from] csv::Error),

    #[error("invalid amount {0}: amounts must be positive")]
    #[diagnostic(code(ledger::invalid_amount))]
    InvalidAmount(Decimal),

    #[error("insufficient funds: tried to withdraw {requested}, but the balance is only {available}")]
    #[diagnostic(code(ledger::insufficient_funds))]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("balance overflow: adding {added} to {balance} exceeds the representable range")]
    #[diagnostic(code(ledger::balance_overflow))]
    BalanceOverflow { balance: Decimal, added: Decimal },

    #[error("government id {gov_id} is already registered")]
    #[diagnostic(code(ledger::duplicate_identifier))]
    DuplicateIdentifier { gov_id: String },

    #[error("target account information is incorrect")]
    #[diagnostic(code(ledger::target_not_found))]
    TargetNotFound,

    #[error("an account cannot be closed into itself")]
    #[diagnostic(code(ledger::self_transfer))]
    SelfTransferNotAllowed,

    #[error("account {0} not found")]
    #[diagnostic(code(ledger::account_not_found))]
    AccountNotFound(AccountId),

    #[error("account still holds a balance of {balance}")]
    #[diagnostic(
        code(ledger::balance_not_zero),
        help("transfer the balance to another account before deleting")
    )]
    BalanceNotZero { balance: Decimal },

    #[error("session not found or expired")]
    #[diagnostic(code(ledger::session_not_found))]
    SessionNotFound,

    #[error("timed out waiting for the lock on account {account}")]
    #[diagnostic(code(ledger::lock_timeout), help("the operation can be retried"))]
    LockTimeout { account: AccountId },

    #[error("storage error: {0}")]
    #[diagnostic(code(ledger::storage))]
    Storage(Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    #[diagnostic(code(ledger::io))]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::InvalidInput(_) | LedgerError::InvalidAmount(_) | LedgerError::Csv(_) => {
                ErrorClass::Input
            }
            LedgerError::InsufficientFunds { .. }
            | LedgerError::BalanceOverflow { .. }
            | LedgerError::DuplicateIdentifier { .. }
            | LedgerError::TargetNotFound
            | LedgerError::SelfTransferNotAllowed
            | LedgerError::AccountNotFound(_)
            | LedgerError::BalanceNotZero { .. }
            | LedgerError::SessionNotFound => ErrorClass::Domain,
            LedgerError::LockTimeout { .. } | LedgerError::Storage(_) | LedgerError::Io(_) => {
                ErrorClass::Store
            }
        }
    }

    /// Store faults are transient: nothing was written, so the caller may retry.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Store
    }

    #[cfg(any(feature = "storage-rocksdb", test))]
    pub(crate) fn storage(message: impl Into<String>) -> Self {
        LedgerError::Storage(Box::new(std::io::Error::other(message.into())))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::Storage(Box::new(err))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Storage(Box::new(err))
    }
}
