//! Account error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Credential error: {0}")]
    Credential(#[from] userdb_core::Error),
}

impl AccountError {
    /// True when the outcome could not be determined because the store failed.
    ///
    /// Constraint violations are reported by the store too, but they are a
    /// definite answer about the data, so they do not count.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AccountError::Store(_))
    }
}

impl From<rusqlite::Error> for AccountError {
    fn from(e: rusqlite::Error) -> Self {
        AccountError::Store(e.to_string())
    }
}
