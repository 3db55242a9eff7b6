//! In-memory storage implementation
//!
//! Intended for development and tests. Each transaction works on a copy of
//! the tables that replaces the live copy only when the closure succeeds.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use userdb_core::{RefreshId, VerifyCode};

use super::{
    AccountId, AccountStore, Collection, Lookup, NewAccount, StoreResult, StoreSession, TempUser,
    User,
};
use crate::error::AccountError;

#[derive(Debug, Clone)]
struct Tables {
    temp_users: BTreeMap<AccountId, TempUser>,
    users: BTreeMap<AccountId, User>,
    next_temp_id: i64,
    next_user_id: i64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            temp_users: BTreeMap::new(),
            users: BTreeMap::new(),
            next_temp_id: 1,
            next_user_id: 1,
        }
    }
}

/// In-memory account store
///
/// Every transaction, reads included, takes the write lock and clones all
/// tables, so transactions are fully serialized. That is acceptable for the
/// data sizes of development and tests; use the SQLite store elsewhere.
pub struct InMemoryAccountStore {
    tables: RwLock<Tables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Backdate a temporary user's creation time (for testing purposes).
    /// Returns false if no temporary user has this id.
    pub fn set_temp_user_created_at(&self, id: AccountId, created_at: DateTime<Utc>) -> bool {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        match tables.temp_users.get_mut(&id) {
            Some(user) => {
                user.created_at = created_at;
                true
            }
            None => false,
        }
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn with_transaction<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn StoreSession) -> StoreResult<T>,
    {
        // The live tables are only replaced after success, so a poisoned
        // lock still guards consistent data.
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let mut scratch = tables.clone();

        let out = f(&mut MemorySession {
            tables: &mut scratch,
        })?;

        *tables = scratch;
        Ok(out)
    }
}

struct MemorySession<'t> {
    tables: &'t mut Tables,
}

fn matches_lookup(id: AccountId, email: &str, lookup: &Lookup) -> bool {
    match lookup {
        Lookup::Id(wanted) => id == *wanted,
        Lookup::Email(wanted) => email == wanted.as_str(),
    }
}

impl MemorySession<'_> {
    fn find_temp(&self, lookup: &Lookup) -> Option<&TempUser> {
        match lookup {
            Lookup::Id(id) => self.tables.temp_users.get(id),
            Lookup::Email(_) => self
                .tables
                .temp_users
                .values()
                .find(|u| matches_lookup(u.id, &u.email, lookup)),
        }
    }

    fn find_user(&self, lookup: &Lookup) -> Option<&User> {
        match lookup {
            Lookup::Id(id) => self.tables.users.get(id),
            Lookup::Email(_) => self
                .tables
                .users
                .values()
                .find(|u| matches_lookup(u.id, &u.email, lookup)),
        }
    }
}

impl StoreSession for MemorySession<'_> {
    fn exists(&mut self, collection: Collection, lookup: &Lookup) -> StoreResult<bool> {
        Ok(match collection {
            Collection::Temporary => self.find_temp(lookup).is_some(),
            Collection::Verified => self.find_user(lookup).is_some(),
        })
    }

    fn fetch_temp_user(&mut self, lookup: &Lookup) -> StoreResult<Option<TempUser>> {
        Ok(self.find_temp(lookup).cloned())
    }

    fn fetch_user(&mut self, lookup: &Lookup) -> StoreResult<Option<User>> {
        Ok(self.find_user(lookup).cloned())
    }

    fn insert_temp_user(&mut self, new: &NewAccount, code: &VerifyCode) -> StoreResult<AccountId> {
        if self.find_temp(&Lookup::email(&new.email)).is_some() {
            return Err(AccountError::EmailAlreadyExists(new.email.clone()));
        }

        let id = AccountId(self.tables.next_temp_id);
        self.tables.next_temp_id += 1;
        self.tables.temp_users.insert(
            id,
            TempUser {
                id,
                name: new.name.clone(),
                email: new.email.clone(),
                password_hash: new.password_hash.clone(),
                verify_code: code.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn insert_user(&mut self, new: &NewAccount) -> StoreResult<AccountId> {
        if self.find_user(&Lookup::email(&new.email)).is_some() {
            return Err(AccountError::EmailAlreadyExists(new.email.clone()));
        }

        let id = AccountId(self.tables.next_user_id);
        self.tables.next_user_id += 1;
        self.tables.users.insert(
            id,
            User {
                id,
                name: new.name.clone(),
                email: new.email.clone(),
                password_hash: new.password_hash.clone(),
                refresh_id: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn delete(&mut self, collection: Collection, id: AccountId) -> StoreResult<usize> {
        let removed = match collection {
            Collection::Temporary => self.tables.temp_users.remove(&id).is_some(),
            Collection::Verified => self.tables.users.remove(&id).is_some(),
        };
        Ok(removed as usize)
    }

    fn set_verify_code(&mut self, id: AccountId, code: &VerifyCode) -> StoreResult<usize> {
        match self.tables.temp_users.get_mut(&id) {
            Some(user) => {
                user.verify_code = code.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn set_refresh_id(&mut self, id: AccountId, refresh_id: &RefreshId) -> StoreResult<usize> {
        match self.tables.users.get_mut(&id) {
            Some(user) => {
                user.refresh_id = Some(refresh_id.clone());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_temp_users_before(&mut self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let before = self.tables.temp_users.len();
        self.tables.temp_users.retain(|_, u| u.created_at >= cutoff);
        Ok((before - self.tables.temp_users.len()) as u64)
    }
}
