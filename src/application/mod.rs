//! Application layer orchestrating the ledger.
//!
//! The `AccountRegistry`, `TransactionEngine` and `HistoryReader` share one
//! `LedgerStore` and one `AccountLocks` table; `Ledger` wires them together.
//! `Teller` adds explicit sessions on top for an interactive front end.

pub mod engine;
pub mod history;
pub mod ledger;
pub mod locks;
pub mod registry;
pub mod session;
pub mod teller;
