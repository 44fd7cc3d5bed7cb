use super::engine::TransactionEngine;
use super::history::HistoryReader;
use super::locks::AccountLocks;
use super::registry::AccountRegistry;
use crate::config::EngineConfig;
use crate::domain::ports::{CredentialHasherRef, LedgerStoreRef};
use crate::infrastructure::credentials::Sha256Hasher;
use std::sync::Arc;

/// The registry, engine and history reader wired to one store and one lock
/// table.
#[derive(Clone)]
pub struct Ledger {
    pub registry: AccountRegistry,
    pub engine: TransactionEngine,
    pub history: HistoryReader,
}

impl Ledger {
    /// Builds a ledger using salted SHA-256 credential hashing.
    pub fn new(store: LedgerStoreRef, config: EngineConfig) -> Self {
        Self::with_hasher(store, Arc::new(Sha256Hasher::new()), config)
    }

    pub fn with_hasher(store: LedgerStoreRef, hasher: CredentialHasherRef, config: EngineConfig) -> Self {
        let locks = Arc::new(AccountLocks::new(config.lock_timeout));
        let registry = AccountRegistry::new(store.clone(), hasher, locks.clone());
        let engine = TransactionEngine::new(store.clone(), registry.clone(), locks);
        let history = HistoryReader::new(store, config.history_limit);
        Self {
            registry,
            engine,
            history,
        }
    }
}
