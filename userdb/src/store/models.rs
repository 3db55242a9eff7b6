//! Data models for account storage

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use userdb_core::{PasswordHash, RefreshId, VerifyCode};

/// Store-generated account identifier, unique within its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which of the two user collections an operation acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Registered but not yet verified (`temp_users`)
    Temporary,
    /// Verified, permanent accounts (`users`)
    Verified,
}

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Temporary => "temp_users",
            Collection::Verified => "users",
        }
    }
}

/// An email address in canonical form. Only built through [`normalize_email`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedEmail(String);

impl NormalizedEmail {
    pub fn new(email: &str) -> Self {
        Self(normalize_email(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How to find a single account row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Lookup {
    Id(AccountId),
    Email(NormalizedEmail),
}

impl Lookup {
    pub fn id(id: AccountId) -> Self {
        Lookup::Id(id)
    }

    pub fn email(email: &str) -> Self {
        Lookup::Email(NormalizedEmail::new(email))
    }

    pub fn column(&self) -> &'static str {
        match self {
            Lookup::Id(_) => "id",
            Lookup::Email(_) => "email",
        }
    }
}

impl From<AccountId> for Lookup {
    fn from(id: AccountId) -> Self {
        Lookup::Id(id)
    }
}

impl From<&str> for Lookup {
    fn from(email: &str) -> Self {
        Lookup::email(email)
    }
}

/// Canonical form used for storing and comparing email addresses
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An account awaiting email verification
#[derive(Debug, Clone)]
pub struct TempUser {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub verify_code: VerifyCode,
    pub created_at: DateTime<Utc>,
}

/// A verified account
#[derive(Debug, Clone)]
pub struct User {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    /// None until the first refresh id is issued
    pub refresh_id: Option<RefreshId>,
    pub created_at: DateTime<Utc>,
}

/// A row from either collection
#[derive(Debug, Clone)]
pub enum Account {
    Temporary(TempUser),
    Verified(User),
}

impl Account {
    pub fn id(&self) -> AccountId {
        match self {
            Account::Temporary(u) => u.id,
            Account::Verified(u) => u.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Account::Temporary(u) => &u.name,
            Account::Verified(u) => &u.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Temporary(u) => &u.email,
            Account::Verified(u) => &u.email,
        }
    }

    pub fn password_hash(&self) -> &PasswordHash {
        match self {
            Account::Temporary(u) => &u.password_hash,
            Account::Verified(u) => &u.password_hash,
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            Account::Temporary(_) => Collection::Temporary,
            Account::Verified(_) => Collection::Verified,
        }
    }
}

/// Insert payload shared by both collections
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    /// Must already be normalized
    pub email: String,
    pub password_hash: PasswordHash,
}

/// Password as supplied to account creation
#[derive(Debug, Clone)]
pub enum Credential<'a> {
    /// Hashed before storage
    Plaintext(&'a str),
    /// Stored verbatim
    Hashed(PasswordHash),
}

/// Result of creating an account
#[derive(Debug, Clone)]
pub struct Created {
    pub id: AccountId,
    /// Present only for temporary users
    pub verify_code: Option<VerifyCode>,
}

/// Where an identifier sits in the verification lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Present in neither collection
    Unregistered,
    /// Present in the temporary collection
    Pending,
    /// Present only in the verified collection
    Verified,
}

/// Outcome of comparing a secret against stored state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    Valid,
    /// The account exists but the secret does not match
    Invalid,
    /// No account matched the lookup
    UnknownAccount,
}

impl CredentialCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, CredentialCheck::Valid)
    }
}
