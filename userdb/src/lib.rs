//! userdb account manager
//!
//! Manages user identities across two collections: temporary users awaiting
//! email verification, and verified users. Verification moves a record from
//! the first to the second in one store transaction.

pub mod config;
pub mod error;
pub mod manager;
pub mod store;

pub use config::Config;
pub use error::AccountError;
pub use manager::AccountManager;
pub use store::{
    Account, AccountId, AccountStore, Collection, Created, Credential, CredentialCheck,
    InMemoryAccountStore, Lookup, NormalizedEmail, SqliteAccountStore, StoreResult, StoreSession,
    TempUser, User, VerificationStatus,
};
pub use userdb_core::{
    BcryptHasher, PasswordHash, PasswordHasher, RandomTokenGenerator, RefreshId, TokenGenerator,
    VerifyCode,
};
