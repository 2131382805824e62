//! Credential verification
//!
//! The credential set is built once from configuration and shared read-only
//! by every session. Verification never exits early: every configured user is
//! compared with constant-time equality and the per-user results are folded
//! with a constant-time OR, so neither the position of a match nor the first
//! mismatching byte shows up in the timing.

use crate::config::UserConfig;
use std::fmt;
use subtle::{Choice, ConstantTimeEq};

/// A single username/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: Vec<u8>,
    password: Vec<u8>,
}

impl Credential {
    /// Create a credential from raw bytes
    pub fn new(username: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn matches(&self, username: &[u8], password: &[u8]) -> Choice {
        self.username.as_slice().ct_eq(username) & self.password.as_slice().ct_eq(password)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&UserConfig> for Credential {
    fn from(user: &UserConfig) -> Self {
        Credential::new(user.username.as_bytes(), user.password.as_bytes())
    }
}

/// Immutable set of accepted credentials
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    credentials: Box<[Credential]>,
}

impl Authenticator {
    /// Build an authenticator from an ordered list of credentials
    pub fn new(credentials: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }

    /// Build an authenticator from the configured users
    pub fn from_users(users: &[UserConfig]) -> Self {
        Self::new(users.iter().map(Credential::from))
    }

    /// Number of configured credentials
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether no credentials are configured (every attempt fails)
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Check a presented username/password pair
    pub fn verify(&self, username: &[u8], password: &[u8]) -> bool {
        let (found, _) = self.scan(username, password);
        bool::from(found)
    }

    /// Compare against every credential, returning the folded result and
    /// the number of entries compared.
    fn scan(&self, username: &[u8], password: &[u8]) -> (Choice, usize) {
        self.credentials.iter().fold(
            (Choice::from(0u8), 0usize),
            |(found, compared), credential| {
                (found | credential.matches(username, password), compared + 1)
            },
        )
    }
}
