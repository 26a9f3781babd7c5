//! JSON file-backed CredentialStore implementation.
//!
//! Digests live in `credentials.json` under the site root:
//!
//! ```json
//! { "users": { "admin": { "salt": "…", "digest": "…" } } }
//! ```

use crate::storage::AtomicFile;
use async_trait::async_trait;
use folio_core::auth::{CredentialStore, PasswordDigest};
use folio_core::config::AdminSeed;
use folio_core::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: BTreeMap<String, PasswordDigest>,
}

/// Credential store persisted as a JSON document.
///
/// The whole document is cached in memory; `replace` rewrites the file
/// atomically before the cache is updated, so a failed write leaves both
/// the file and the live credentials unchanged.
pub struct JsonCredentialStore {
    file: AtomicFile,
    cache: RwLock<CredentialFile>,
}

impl JsonCredentialStore {
    /// Opens the credential file at `path`.
    ///
    /// When the file does not exist yet it is created from `seeds`, hashing
    /// each password. An existing file always wins over `seeds`.
    pub async fn open(path: impl AsRef<Path>, seeds: &[AdminSeed]) -> Result<Self> {
        let file = AtomicFile::new(path.as_ref());

        let cache = match file.load_json::<CredentialFile>().await {
            Ok(Some(existing)) => {
                tracing::debug!(
                    path = %file.path().display(),
                    users = existing.users.len(),
                    "Loaded credential file"
                );
                existing
            }
            Ok(None) => {
                let seeded = CredentialFile {
                    users: seeds
                        .iter()
                        .map(|seed| (seed.username.clone(), PasswordDigest::generate(&seed.password)))
                        .collect(),
                };
                file.save_json(&seeded).await?;
                tracing::info!(
                    path = %file.path().display(),
                    users = seeded.users.len(),
                    "Created credential file from configured admins"
                );
                seeded
            }
            Err(e) => {
                return Err(FolioError::config(format!(
                    "unreadable credential file {}: {}",
                    file.path().display(),
                    e
                )));
            }
        };

        if cache.users.is_empty() {
            tracing::warn!("No admin accounts configured; every login will be rejected");
        }

        Ok(Self {
            file,
            cache: RwLock::new(cache),
        })
    }
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let cache = self.cache.read().await;
        Ok(cache
            .users
            .get(username)
            .map(|digest| digest.verify(password))
            .unwrap_or(false))
    }

    async fn replace(&self, username: &str, digest: PasswordDigest) -> Result<()> {
        // Writers hold the lock across the file write so the file and the
        // cache never diverge.
        let mut cache = self.cache.write().await;

        let mut updated = cache.clone();
        updated.users.insert(username.to_string(), digest);

        self.file
            .save_json(&updated)
            .await
            .map_err(|e| FolioError::storage_write(format!("credential file: {}", e)))?;

        *cache = updated;
        Ok(())
    }
}
