//! Storage abstractions for accounts

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::InMemoryAccountStore;
pub use models::*;
pub use sqlite::SqliteAccountStore;

use chrono::{DateTime, Utc};
use userdb_core::{RefreshId, VerifyCode};

use crate::error::AccountError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, AccountError>;

/// A backing store that hands out scoped sessions
pub trait AccountStore: Send + Sync {
    /// Run `f` inside a single transaction.
    ///
    /// The connection is held for the duration of the call. An `Ok` result
    /// commits; an `Err` (or a panic) leaves the store exactly as it was.
    fn with_transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn StoreSession) -> StoreResult<T>;
}

/// Row-level operations available inside a transaction
pub trait StoreSession {
    /// Check whether a row matching the lookup exists
    fn exists(&mut self, collection: Collection, lookup: &Lookup) -> StoreResult<bool>;

    /// Fetch a temporary user
    fn fetch_temp_user(&mut self, lookup: &Lookup) -> StoreResult<Option<TempUser>>;

    /// Fetch a verified user
    fn fetch_user(&mut self, lookup: &Lookup) -> StoreResult<Option<User>>;

    /// Insert a temporary user and return its generated id
    fn insert_temp_user(&mut self, new: &NewAccount, code: &VerifyCode) -> StoreResult<AccountId>;

    /// Insert a verified user and return its generated id
    fn insert_user(&mut self, new: &NewAccount) -> StoreResult<AccountId>;

    /// Delete one row by id, returning the number of rows removed
    fn delete(&mut self, collection: Collection, id: AccountId) -> StoreResult<usize>;

    /// Replace a temporary user's verify code, returning the number of rows updated
    fn set_verify_code(&mut self, id: AccountId, code: &VerifyCode) -> StoreResult<usize>;

    /// Replace a verified user's refresh id, returning the number of rows updated
    fn set_refresh_id(&mut self, id: AccountId, refresh_id: &RefreshId) -> StoreResult<usize>;

    /// Delete temporary users created before the cutoff
    fn delete_temp_users_before(&mut self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

// Allow sharing one store between several managers
impl<S: AccountStore> AccountStore for std::sync::Arc<S> {
    fn with_transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn StoreSession) -> StoreResult<T>,
    {
        (**self).with_transaction(f)
    }
}
