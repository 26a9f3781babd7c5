//! Folio configuration model.
//!
//! Deserialized from `folio.toml`; every field has a default so an empty or
//! missing file yields a runnable configuration.

use crate::auth::DEFAULT_SESSION_TIMEOUT_MINUTES;
use crate::content::{ContentTypeRegistry, DEFAULT_RETENTION};
use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Upper bound on the idle timeout (30 days).
pub const MAX_SESSION_TIMEOUT_MINUTES: i64 = 30 * 24 * 60;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct FolioConfig {
    /// Holds `data/`, `backups/` and `credentials.json`
    pub root_dir: PathBuf,
    pub session_timeout_minutes: i64,
    /// Archived versions kept per content type
    pub retention: usize,
    pub server: ServerConfig,
    /// Accounts written to the credential file when it does not exist yet
    pub admins: Vec<AdminSeed>,
    /// Replaces the built-in content-type table when present
    pub content_types: Option<BTreeMap<String, String>>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("site"),
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
            retention: DEFAULT_RETENTION,
            server: ServerConfig::default(),
            admins: Vec::new(),
            content_types: None,
        }
    }
}

impl FolioConfig {
    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.retention == 0 {
            return Err(FolioError::config("retention must be at least 1"));
        }
        if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&self.session_timeout_minutes) {
            return Err(FolioError::config(format!(
                "session_timeout_minutes must be between 1 and {}",
                MAX_SESSION_TIMEOUT_MINUTES
            )));
        }
        if self.admins.iter().any(|a| a.username.trim().is_empty()) {
            return Err(FolioError::config("admin usernames must not be empty"));
        }
        self.registry().map(|_| ())
    }

    /// The content-type registry this configuration selects.
    pub fn registry(&self) -> Result<ContentTypeRegistry> {
        match &self.content_types {
            Some(entries) => ContentTypeRegistry::from_entries(entries.clone()),
            None => Ok(ContentTypeRegistry::default()),
        }
    }

    /// The idle timeout as a duration. Fails instead of overflowing when
    /// the configured minutes do not fit.
    pub fn session_timeout(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_minutes(self.session_timeout_minutes).ok_or_else(|| {
            FolioError::config(format!(
                "session_timeout_minutes {} is out of range",
                self.session_timeout_minutes
            ))
        })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Bootstrap account. Only ever hashed, never persisted as given.
#[derive(Deserialize, Serialize, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
