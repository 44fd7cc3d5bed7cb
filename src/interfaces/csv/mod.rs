//! CSV adapters used by the batch binary.

pub mod account_writer;
pub mod operation_reader;
