//! Credential hashing
//!
//! Passwords are never stored in plaintext. The account layer only ever sees
//! the opaque [`PasswordHash`] produced here and hands it back to
//! [`PasswordHasher::verify`].

use std::fmt;

use crate::{Error, Result};

/// Default bcrypt cost factor
pub const DEFAULT_BCRYPT_COST: u32 = 12;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// An opaque, salted one-way password hash.
///
/// The salt travels inside the hash string, so the value is self-contained.
/// Two hashes of the same plaintext differ.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash loaded from storage. No validation happens until verify.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// Keep hashes out of logs.
impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Capability for hashing and checking passwords
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password with a fresh salt
    fn hash(&self, plaintext: &str) -> Result<PasswordHash>;

    /// Check a plaintext password against a stored hash
    fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool>;
}

/// bcrypt-backed [`PasswordHasher`]
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Result<Self> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(Error::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash> {
        Ok(PasswordHash(bcrypt::hash(plaintext, self.cost)?))
    }

    fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool> {
        Ok(bcrypt::verify(plaintext, hash.as_str())?)
    }
}

impl<H: PasswordHasher + ?Sized> PasswordHasher for Box<H> {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash> {
        (**self).hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &PasswordHash) -> Result<bool> {
        (**self).verify(plaintext, hash)
    }
}
