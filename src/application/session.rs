use crate::domain::account::AccountId;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An opaque bearer token for an authenticated account holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory session table mapping tokens to account ids.
#[derive(Default, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionToken, AccountId>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, account: AccountId) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions.write().await.insert(token.clone(), account);
        token
    }

    pub async fn resolve(&self, token: &SessionToken) -> Result<AccountId> {
        self.sessions
            .read()
            .await
            .get(token)
            .copied()
            .ok_or(LedgerError::SessionNotFound)
    }

    /// Ends one session. Returns whether it existed.
    pub async fn end(&self, token: &SessionToken) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Ends every session of an account, e.g. after it was closed.
    pub async fn end_all_for(&self, account: AccountId) {
        self.sessions.write().await.retain(|_, id| *id != account);
    }
}
