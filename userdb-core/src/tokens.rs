//! Opaque account tokens
//!
//! Verify codes prove control of a registration email. Refresh ids authorize
//! reissuing session credentials. Both are single-use-replaceable: storing a
//! new one invalidates the old one.

use std::fmt;

use rand::RngCore;
use subtle::ConstantTimeEq;

/// Length of a generated refresh id in bytes
pub const REFRESH_ID_LEN: usize = 32;

/// Verification code for a temporary user (32 lowercase hex characters when generated)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VerifyCode(String);

impl VerifyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality
    pub fn matches(&self, other: &VerifyCode) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for VerifyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerifyCode(..)")
    }
}

impl fmt::Display for VerifyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary refresh token for a verified user
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RefreshId(Vec<u8>);

impl RefreshId {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Constant-time equality
    pub fn matches(&self, other: &RefreshId) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl fmt::Debug for RefreshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefreshId({} bytes)", self.0.len())
    }
}

/// Capability for minting unguessable tokens
pub trait TokenGenerator: Send + Sync {
    fn verify_code(&self) -> VerifyCode;

    fn refresh_id(&self) -> RefreshId;
}

/// Generates tokens from the operating system seeded thread RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl RandomTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn verify_code(&self) -> VerifyCode {
        VerifyCode(uuid::Uuid::new_v4().simple().to_string())
    }

    fn refresh_id(&self) -> RefreshId {
        let mut bytes = vec![0u8; REFRESH_ID_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        RefreshId(bytes)
    }
}

impl<G: TokenGenerator + ?Sized> TokenGenerator for Box<G> {
    fn verify_code(&self) -> VerifyCode {
        (**self).verify_code()
    }

    fn refresh_id(&self) -> RefreshId {
        (**self).refresh_id()
    }
}
