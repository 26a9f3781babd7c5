//! Credential storage seam and salted password digests.

use crate::error::Result;
use async_trait::async_trait;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SALT_LEN: usize = 16;

/// Salted SHA-256 digest of a password. The plaintext is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordDigest {
    /// Hex-encoded random salt
    pub salt: String,
    /// Hex-encoded `sha256(salt || password)`
    pub digest: String,
}

impl PasswordDigest {
    /// Hashes `password` under a fresh random salt.
    pub fn generate(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::with_salt(&salt, password)
    }

    fn with_salt(salt: &[u8], password: &str) -> Self {
        Self {
            salt: hex::encode(salt),
            digest: hex::encode(compute(salt, password)),
        }
    }

    /// Checks `password` against this digest.
    pub fn verify(&self, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (hex::decode(&self.salt), hex::decode(&self.digest)) else {
            return false;
        };
        let actual = compute(&salt, password);
        constant_time_eq(&actual, &expected)
    }
}

fn compute(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// An abstract store of admin credentials.
///
/// Decouples the session layer from where digests live (memory, a JSON
/// file, ...). Implementations must make `replace` atomic: a concurrent
/// `verify` sees either the old digest or the new one.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns true iff `username` exists and `password` matches.
    async fn verify(&self, username: &str, password: &str) -> Result<bool>;

    /// Replaces the digest for an existing or new user.
    async fn replace(&self, username: &str, digest: PasswordDigest) -> Result<()>;
}

/// Credential store kept entirely in memory.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, PasswordDigest>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding, mostly for tests and bootstrapping.
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users
            .get_mut()
            .insert(username.to_string(), PasswordDigest::generate(password));
        self
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let users = self.users.read().await;
        Ok(users
            .get(username)
            .map(|digest| digest.verify(password))
            .unwrap_or(false))
    }

    async fn replace(&self, username: &str, digest: PasswordDigest) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(username.to_string(), digest);
        Ok(())
    }
}
