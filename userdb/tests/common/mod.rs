//! Common test utilities for account manager integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use userdb::store::NewAccount;
use userdb::{
    AccountError, AccountId, AccountManager, AccountStore, BcryptHasher, Collection,
    InMemoryAccountStore, Lookup, RandomTokenGenerator, RefreshId, SqliteAccountStore,
    StoreResult, StoreSession, TempUser, User, VerifyCode,
};

/// Lowest cost bcrypt accepts; keeps the suite fast
pub const TEST_COST: u32 = 4;

pub fn hasher() -> BcryptHasher {
    BcryptHasher::new(TEST_COST).unwrap()
}

pub fn manager_with<S: AccountStore>(store: S) -> AccountManager<S> {
    AccountManager::new(store, hasher(), RandomTokenGenerator::new())
}

pub fn memory_manager() -> AccountManager<InMemoryAccountStore> {
    manager_with(InMemoryAccountStore::new())
}

/// SQLite-backed manager; keep the TempDir alive for the test's duration
pub fn sqlite_manager() -> (AccountManager<SqliteAccountStore>, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("accounts.db");
    let store = SqliteAccountStore::open(path.to_str().unwrap()).unwrap();
    (manager_with(store), dir)
}

/// Store whose connection can never be acquired
pub struct UnreachableStore;

impl AccountStore for UnreachableStore {
    fn with_transaction<T, F>(&self, _f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn StoreSession) -> StoreResult<T>,
    {
        Err(AccountError::Store("connection refused".to_string()))
    }
}

/// Wraps a real store but fails every insert into the verified collection
pub struct FailingUserInsertStore<S> {
    pub inner: S,
}

impl<S: AccountStore> AccountStore for FailingUserInsertStore<S> {
    fn with_transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn StoreSession) -> StoreResult<T>,
    {
        self.inner
            .with_transaction(|session| f(&mut FailingUserInsert { inner: session }))
    }
}

struct FailingUserInsert<'a> {
    inner: &'a mut dyn StoreSession,
}

impl StoreSession for FailingUserInsert<'_> {
    fn exists(&mut self, collection: Collection, lookup: &Lookup) -> StoreResult<bool> {
        self.inner.exists(collection, lookup)
    }

    fn fetch_temp_user(&mut self, lookup: &Lookup) -> StoreResult<Option<TempUser>> {
        self.inner.fetch_temp_user(lookup)
    }

    fn fetch_user(&mut self, lookup: &Lookup) -> StoreResult<Option<User>> {
        self.inner.fetch_user(lookup)
    }

    fn insert_temp_user(&mut self, new: &NewAccount, code: &VerifyCode) -> StoreResult<AccountId> {
        self.inner.insert_temp_user(new, code)
    }

    fn insert_user(&mut self, _new: &NewAccount) -> StoreResult<AccountId> {
        Err(AccountError::Store("disk I/O error".to_string()))
    }

    fn delete(&mut self, collection: Collection, id: AccountId) -> StoreResult<usize> {
        self.inner.delete(collection, id)
    }

    fn set_verify_code(&mut self, id: AccountId, code: &VerifyCode) -> StoreResult<usize> {
        self.inner.set_verify_code(id, code)
    }

    fn set_refresh_id(&mut self, id: AccountId, refresh_id: &RefreshId) -> StoreResult<usize> {
        self.inner.set_refresh_id(id, refresh_id)
    }

    fn delete_temp_users_before(&mut self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        self.inner.delete_temp_users_before(cutoff)
    }
}
