//! Account lifecycle operations
//!
//! [`AccountManager`] owns a store, a password hasher and a token generator.
//! Every public operation runs in its own store transaction, so a connection
//! is held only for the duration of one call and released on every path.

use chrono::Utc;
use userdb_core::{
    BcryptHasher, PasswordHash, PasswordHasher, RandomTokenGenerator, RefreshId, TokenGenerator,
    VerifyCode,
};

use crate::config::Config;
use crate::store::{
    normalize_email, Account, AccountId, AccountStore, Collection, Created, Credential,
    CredentialCheck, Lookup, NewAccount, SqliteAccountStore, StoreResult, TempUser, User,
    VerificationStatus,
};

pub struct AccountManager<S, H = BcryptHasher, G = RandomTokenGenerator> {
    store: S,
    hasher: H,
    tokens: G,
}

impl AccountManager<SqliteAccountStore> {
    /// Open the configured SQLite database with a bcrypt hasher
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let hasher = BcryptHasher::new(config.bcrypt_cost)?;
        let store = SqliteAccountStore::open(&config.database_path)?;
        Ok(Self::new(store, hasher, RandomTokenGenerator::new()))
    }
}

impl<S, H, G> AccountManager<S, H, G>
where
    S: AccountStore,
    H: PasswordHasher,
    G: TokenGenerator,
{
    pub fn new(store: S, hasher: H, tokens: G) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check whether an account exists in the given collection
    pub fn user_exists(&self, lookup: &Lookup, collection: Collection) -> StoreResult<bool> {
        self.store
            .with_transaction(|session| session.exists(collection, lookup))
    }

    /// Report where an identifier sits in the verification lifecycle.
    ///
    /// The temporary collection wins: an identifier present there is
    /// `Pending` even if the verified collection also holds it.
    pub fn is_verified(&self, lookup: &Lookup) -> StoreResult<VerificationStatus> {
        self.store.with_transaction(|session| {
            if session.exists(Collection::Temporary, lookup)? {
                return Ok(VerificationStatus::Pending);
            }
            if session.exists(Collection::Verified, lookup)? {
                return Ok(VerificationStatus::Verified);
            }
            Ok(VerificationStatus::Unregistered)
        })
    }

    /// Create an account.
    ///
    /// Temporary accounts get a fresh verify code, which is returned.
    /// A duplicate email within the collection fails with
    /// `AccountError::EmailAlreadyExists`.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        credential: Credential<'_>,
        collection: Collection,
    ) -> StoreResult<Created> {
        // Hash before taking the connection
        let password_hash = match credential {
            Credential::Plaintext(plaintext) => self.hasher.hash(plaintext)?,
            Credential::Hashed(hash) => hash,
        };

        let new = NewAccount {
            name: name.to_string(),
            email: normalize_email(email),
            password_hash,
        };

        let created = match collection {
            Collection::Temporary => {
                let code = self.tokens.verify_code();
                let id = self
                    .store
                    .with_transaction(|session| session.insert_temp_user(&new, &code))?;
                Created {
                    id,
                    verify_code: Some(code),
                }
            }
            Collection::Verified => {
                let id = self
                    .store
                    .with_transaction(|session| session.insert_user(&new))?;
                Created {
                    id,
                    verify_code: None,
                }
            }
        };

        tracing::info!(id = %created.id, ?collection, "Created user");
        Ok(created)
    }

    /// Delete one account by id. Returns false if nothing was deleted.
    pub fn delete_user(&self, id: AccountId, collection: Collection) -> StoreResult<bool> {
        let deleted = self
            .store
            .with_transaction(|session| session.delete(collection, id))?;

        tracing::debug!(id = %id, ?collection, deleted, "Delete user");
        Ok(deleted == 1)
    }

    pub fn get_user(&self, lookup: &Lookup, collection: Collection) -> StoreResult<Option<Account>> {
        Ok(match collection {
            Collection::Temporary => self.get_temp_user(lookup)?.map(Account::Temporary),
            Collection::Verified => self.get_verified_user(lookup)?.map(Account::Verified),
        })
    }

    pub fn get_temp_user(&self, lookup: &Lookup) -> StoreResult<Option<TempUser>> {
        self.store
            .with_transaction(|session| session.fetch_temp_user(lookup))
    }

    pub fn get_verified_user(&self, lookup: &Lookup) -> StoreResult<Option<User>> {
        self.store
            .with_transaction(|session| session.fetch_user(lookup))
    }

    pub fn get_user_id(&self, email: &str, collection: Collection) -> StoreResult<Option<AccountId>> {
        let lookup = Lookup::email(email);
        Ok(self.get_user(&lookup, collection)?.map(|account| account.id()))
    }

    /// Replace a temporary user's verify code. The old code stops matching.
    pub fn refresh_verify_code(&self, id: AccountId) -> StoreResult<Option<VerifyCode>> {
        let code = self.tokens.verify_code();
        let updated = self
            .store
            .with_transaction(|session| session.set_verify_code(id, &code))?;

        if updated == 0 {
            tracing::debug!(id = %id, "No temporary user to refresh verify code for");
            return Ok(None);
        }
        Ok(Some(code))
    }

    /// Replace a verified user's refresh id. The old id stops matching.
    pub fn refresh_refresh_id(&self, id: AccountId) -> StoreResult<Option<RefreshId>> {
        let refresh_id = self.tokens.refresh_id();
        let updated = self
            .store
            .with_transaction(|session| session.set_refresh_id(id, &refresh_id))?;

        if updated == 0 {
            tracing::debug!(id = %id, "No user to refresh refresh id for");
            return Ok(None);
        }
        Ok(Some(refresh_id))
    }

    pub fn check_verify_code(&self, id: AccountId, code: &VerifyCode) -> StoreResult<CredentialCheck> {
        let user = self.get_temp_user(&Lookup::Id(id))?;
        Ok(match user {
            None => CredentialCheck::UnknownAccount,
            Some(user) if user.verify_code.matches(code) => CredentialCheck::Valid,
            Some(_) => CredentialCheck::Invalid,
        })
    }

    /// A user who was never issued a refresh id never matches.
    pub fn check_refresh_id(
        &self,
        id: AccountId,
        refresh_id: &RefreshId,
    ) -> StoreResult<CredentialCheck> {
        let user = self.get_verified_user(&Lookup::Id(id))?;
        Ok(match user {
            None => CredentialCheck::UnknownAccount,
            Some(user) => match user.refresh_id {
                Some(stored) if stored.matches(refresh_id) => CredentialCheck::Valid,
                _ => CredentialCheck::Invalid,
            },
        })
    }

    /// Check a plaintext password against a verified user's stored hash.
    /// Temporary users cannot authenticate and are reported as unknown.
    pub fn check_password(&self, lookup: &Lookup, plaintext: &str) -> StoreResult<CredentialCheck> {
        let hash: Option<PasswordHash> = self
            .get_verified_user(lookup)?
            .map(|user| user.password_hash);

        let Some(hash) = hash else {
            return Ok(CredentialCheck::UnknownAccount);
        };

        if self.hasher.verify(plaintext, &hash)? {
            Ok(CredentialCheck::Valid)
        } else {
            Ok(CredentialCheck::Invalid)
        }
    }

    /// Promote a temporary user to a verified user.
    ///
    /// The read, delete and insert share one transaction: if the insert
    /// fails (for example because the email is already verified) the
    /// temporary record is left in place and the error is returned.
    /// Returns `None` when no temporary user has this id.
    pub fn transform_verified_user(&self, id: AccountId) -> StoreResult<Option<AccountId>> {
        let result = self.store.with_transaction(|session| {
            let Some(temp) = session.fetch_temp_user(&Lookup::Id(id))? else {
                return Ok(None);
            };

            if session.delete(Collection::Temporary, id)? != 1 {
                return Ok(None);
            }

            // Carry the hash over as-is; the plaintext is long gone.
            let new = NewAccount {
                name: temp.name,
                email: temp.email,
                password_hash: temp.password_hash,
            };
            session.insert_user(&new).map(Some)
        });

        match &result {
            Ok(Some(new_id)) => tracing::info!(temp_id = %id, id = %new_id, "Verified user"),
            Ok(None) => tracing::warn!(temp_id = %id, "No temporary user to verify"),
            Err(e) => tracing::warn!(temp_id = %id, error = %e, "Verification rolled back"),
        }
        result
    }

    /// Delete temporary users registered more than `max_age` ago.
    ///
    /// A zero or negative `max_age` would reach registrations made a moment
    /// ago, so it purges nothing. Neither does one reaching past the earliest
    /// representable time.
    pub fn purge_expired_temp_users(&self, max_age: chrono::Duration) -> StoreResult<u64> {
        if max_age <= chrono::Duration::zero() {
            tracing::warn!(?max_age, "Refusing to purge with a non-positive max age");
            return Ok(0);
        }
        let Some(cutoff) = Utc::now().checked_sub_signed(max_age) else {
            tracing::debug!("Purge cutoff predates every timestamp, nothing to purge");
            return Ok(0);
        };
        let removed = self
            .store
            .with_transaction(|session| session.delete_temp_users_before(cutoff))?;

        if removed > 0 {
            tracing::info!(removed, "Purged expired temporary users");
        }
        Ok(removed)
    }
}
