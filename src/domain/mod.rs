pub mod account;
pub mod batch;
pub mod ports;
pub mod transaction;
