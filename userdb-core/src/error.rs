//! Error types for userdb-core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Invalid hasher cost {0} (bcrypt accepts 4 to 31)")]
    InvalidCost(u32),
}
