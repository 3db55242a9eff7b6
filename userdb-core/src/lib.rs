//! userdb core library
//!
//! Store-independent pieces of the account subsystem:
//! - a slow, salted credential hasher (bcrypt)
//! - generators for opaque verify codes and refresh ids
//! - the value types those produce, compared in constant time

pub mod credentials;
pub mod error;
pub mod tokens;

pub use credentials::{BcryptHasher, PasswordHash, PasswordHasher, DEFAULT_BCRYPT_COST};
pub use error::Error;
pub use tokens::{RandomTokenGenerator, RefreshId, TokenGenerator, VerifyCode};

/// Result type for userdb-core operations
pub type Result<T> = std::result::Result<T, Error>;
