use crate::domain::account::{NewAccount, TargetCredentials};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Register,
    Deposit,
    Withdraw,
    Close,
}

/// One raw row of an operation script.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRecord {
    pub r#type: OperationType,
    pub username: String,
    pub credential: String,
    #[serde(default)]
    pub gov_id: Option<String>,
    /// Kept as text so it is parsed exactly, never through a float.
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub target_username: Option<String>,
    #[serde(default)]
    pub target_credential: Option<String>,
    #[serde(default)]
    pub target_gov_id: Option<String>,
}

/// A teller operation with all the fields its type requires.
#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Register(NewAccount),
    Deposit {
        username: String,
        credential: String,
        amount: Decimal,
    },
    Withdraw {
        username: String,
        credential: String,
        amount: Decimal,
    },
    Close {
        username: String,
        credential: String,
        target: TargetCredentials,
    },
}

fn required<T>(value: Option<T>, field: &str, op: OperationType) -> Result<T> {
    value.ok_or_else(|| LedgerError::InvalidInput(format!("{op:?} requires {field}")))
}

fn exact_amount(raw: Option<String>) -> Result<Option<Decimal>> {
    raw.map(|text| {
        Decimal::from_str_exact(&text)
            .map_err(|e| LedgerError::InvalidInput(format!("amount {text:?}: {e}")))
    })
    .transpose()
}

impl TryFrom<OperationRecord> for Operation {
    type Error = LedgerError;

    fn try_from(record: OperationRecord) -> Result<Self> {
        let op = record.r#type;
        let amount = exact_amount(record.amount)?;
        Ok(match op {
            OperationType::Register => Operation::Register(NewAccount::new(
                record.username,
                record.credential,
                required(record.gov_id, "gov_id", op)?,
                amount.unwrap_or(Decimal::ZERO),
            )),
            OperationType::Deposit => Operation::Deposit {
                username: record.username,
                credential: record.credential,
                amount: required(amount, "amount", op)?,
            },
            OperationType::Withdraw => Operation::Withdraw {
                username: record.username,
                credential: record.credential,
                amount: required(amount, "amount", op)?,
            },
            OperationType::Close => Operation::Close {
                username: record.username,
                credential: record.credential,
                target: TargetCredentials::new(
                    required(record.target_username, "target_username", op)?,
                    required(record.target_credential, "target_credential", op)?,
                    required(record.target_gov_id, "target_gov_id", op)?,
                ),
            },
        })
    }
}

/// Reads teller operations from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and accepting rows that omit
/// trailing columns.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a new `OperationReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and validates operations, one `Result` per row.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader.into_deserialize().map(|result| {
            let record: OperationRecord = result?;
            Operation::try_from(record)
        })
    }
}
