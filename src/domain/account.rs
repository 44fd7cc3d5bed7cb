use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned account identifier. Never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative monetary value held by an account.
///
/// The only way to lower a balance is [`Balance::debit`], which refuses to go
/// below zero, so a `Balance` can never be negative once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(Decimal);

/// A strictly positive monetary amount for a deposit or withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(LedgerError::InvalidInput(format!(
                "balance cannot be negative, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds `amount`, failing with `BalanceOverflow` past the representable range.
    pub fn credit(self, amount: Amount) -> Result<Self> {
        self.checked_add(Self(amount.0))
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(LedgerError::BalanceOverflow {
                balance: self.0,
                added: other.0,
            })
    }

    pub fn debit(self, amount: Amount) -> Result<Self> {
        if amount.0 > self.0 {
            return Err(LedgerError::InsufficientFunds {
                requested: amount.0,
                available: self.0,
            });
        }
        Ok(Self(self.0 - amount.0))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// A registered account as held by the ledger store.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    /// Opaque to the ledger; produced and checked by a `CredentialHasher`.
    pub credential_hash: String,
    pub gov_id: String,
    pub balance: Balance,
}

impl Account {
    /// Adds funds and returns the new balance; leaves it untouched on overflow.
    pub fn deposit(&mut self, amount: Amount) -> Result<Balance> {
        self.balance = self.balance.credit(amount)?;
        Ok(self.balance)
    }

    /// Removes funds if sufficient; leaves the balance untouched otherwise.
    pub fn withdraw(&mut self, amount: Amount) -> Result<Balance> {
        self.balance = self.balance.debit(amount)?;
        Ok(self.balance)
    }
}

/// A registration request as received from the caller, before any hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub username: String,
    pub credential: String,
    pub gov_id: String,
    pub initial_balance: Decimal,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        credential: impl Into<String>,
        gov_id: impl Into<String>,
        initial_balance: Decimal,
    ) -> Self {
        Self {
            username: username.into(),
            credential: credential.into(),
            gov_id: gov_id.into(),
            initial_balance,
        }
    }

    pub fn validate(&self) -> Result<Balance> {
        for (field, value) in [
            ("username", &self.username),
            ("credential", &self.credential),
            ("gov_id", &self.gov_id),
        ] {
            if value.trim().is_empty() {
                return Err(LedgerError::InvalidInput(format!("{field} is required")));
            }
        }
        Balance::new(self.initial_balance)
    }
}

/// A validated account ready to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDraft {
    pub username: String,
    pub credential_hash: String,
    pub gov_id: String,
    pub balance: Balance,
}

impl AccountDraft {
    pub fn into_account(self, id: AccountId) -> Account {
        Account {
            id,
            username: self.username,
            credential_hash: self.credential_hash,
            gov_id: self.gov_id,
            balance: self.balance,
        }
    }
}

/// The three factors identifying the receiving account of a closure.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCredentials {
    pub username: String,
    pub credential: String,
    pub gov_id: String,
}

impl TargetCredentials {
    pub fn new(
        username: impl Into<String>,
        credential: impl Into<String>,
        gov_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            credential: credential.into(),
            gov_id: gov_id.into(),
        }
    }
}
