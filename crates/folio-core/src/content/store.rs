//! Versioned store trait.
//!
//! Defines the interface for writing content records with automatic
//! archiving of the previous version.

use super::model::{Version, VersionInfo};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Default number of archived versions kept per content type.
pub const DEFAULT_RETENTION: usize = 10;

/// Durable storage for content records and their version history.
///
/// # Implementation Notes
///
/// Implementations must:
/// - archive the current record before overwriting it (best-effort)
/// - replace the canonical record atomically (fatal on failure)
/// - prune history down to the retention window after every write or
///   restore (best-effort)
#[async_trait]
pub trait VersionedStore: Send + Sync {
    /// Writes `payload` as the new current content of `content_type`.
    ///
    /// # Returns
    ///
    /// - `Ok(VersionInfo)`: Canonical file replaced
    /// - `Err(UnknownContentType)`: Type not registered
    /// - `Err(StorageWrite)`: Canonical write failed; nothing changed
    async fn write(&self, content_type: &str, payload: &Value) -> Result<VersionInfo>;

    /// Lists archived versions, newest first. Empty when none exist.
    async fn list_versions(&self, content_type: &str) -> Result<Vec<Version>>;

    /// Makes the named version current again, byte for byte.
    ///
    /// The content current before the restore is archived first, so a
    /// restore can itself be undone.
    async fn restore(&self, content_type: &str, version_id: &str) -> Result<VersionInfo>;

    /// Reads the current content.
    ///
    /// - `Err(ContentNotFound)`: Registered but never written
    async fn read_current(&self, content_type: &str) -> Result<Value>;

    /// Reads one archived version.
    async fn read_version(&self, content_type: &str, version_id: &str) -> Result<Value>;
}
