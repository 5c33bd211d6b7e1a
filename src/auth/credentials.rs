//! Credential lookup used by the login boundary.

use async_trait::async_trait;
use std::collections::HashMap;
use subtle::{Choice, ConstantTimeEq};

/// Source of truth for `{identity, secret}` pairs.
///
/// Implementations may hit a database or an identity provider, hence async.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Return `true` if `secret` is the current secret for `identity`.
    async fn verify(&self, identity: &str, secret: &str) -> bool;
}

/// Credential store backed by a fixed in-memory table.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<(String, String)> for InMemoryCredentialStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCredentialStore")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn verify(&self, identity: &str, secret: &str) -> bool {
        let stored = self.users.get(identity);
        let found = Choice::from(stored.is_some() as u8);
        // Unknown identities still pay for a comparison.
        let candidate = stored.map(String::as_bytes).unwrap_or(secret.as_bytes());
        (found & candidate.ct_eq(secret.as_bytes())).into()
    }
}
