//! Filesystem-backed VersionedStore implementation.
//!
//! Canonical content lives in `data/<file>`; every overwrite first copies the
//! previous bytes to `backups/<stamp>_<file>`. History is pruned to the
//! retention window after each write or restore.

use crate::paths::FolioPaths;
use crate::storage::AtomicFile;
use async_trait::async_trait;
use folio_core::best_effort::best_effort;
use folio_core::clock::Clock;
use folio_core::content::{
    ContentTypeRegistry, DEFAULT_RETENTION, Version, VersionId, VersionInfo, VersionedStore,
};
use folio_core::{FolioError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

/// Filesystem VersionedStore.
///
/// Writers to the same content type are serialized by a per-type mutex held
/// across archive → write → prune, so two overlapping writes resolve to
/// "last writer wins" without interleaving their steps. Different types
/// never contend.
pub struct FsVersionedStore {
    paths: FolioPaths,
    registry: Arc<ContentTypeRegistry>,
    retention: usize,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FsVersionedStore {
    /// Creates a store rooted at `paths`, creating its directories.
    ///
    /// # Errors
    ///
    /// Returns an error if `data/` or `backups/` cannot be created.
    pub async fn new(
        paths: FolioPaths,
        registry: Arc<ContentTypeRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::with_retention(paths, registry, clock, DEFAULT_RETENTION).await
    }

    pub async fn with_retention(
        paths: FolioPaths,
        registry: Arc<ContentTypeRegistry>,
        clock: Arc<dyn Clock>,
        retention: usize,
    ) -> Result<Self> {
        if retention == 0 {
            return Err(FolioError::config("retention must be at least 1"));
        }
        paths.ensure_dirs().await?;

        Ok(Self {
            paths,
            registry,
            retention,
            clock,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn paths(&self) -> &FolioPaths {
        &self.paths
    }

    async fn lock_for(&self, content_type: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(content_type.to_string()).or_default().clone()
    }

    /// Reads the version directory for one file, newest first.
    async fn scan_versions(&self, content_type: &str, file_name: &str) -> Result<Vec<Version>> {
        let backups_dir = self.paths.backups_dir();
        let mut entries = match fs::read_dir(&backups_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(id) = VersionId::parse(name) else {
                continue;
            };
            if id.file_name != file_name {
                continue;
            }
            versions.push(Version {
                content_type: content_type.to_string(),
                path: entry.path(),
                id,
            });
        }

        versions.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(versions)
    }

    /// Copies the current file into a new version. `Ok(None)` when there is
    /// no current file (first write).
    async fn archive_current(&self, content_type: &str, file_name: &str) -> Result<Option<Version>> {
        let current = AtomicFile::new(self.paths.content_file(file_name));
        let Some(bytes) = current.load_bytes().await? else {
            return Ok(None);
        };

        let existing = self.scan_versions(content_type, file_name).await?;
        let id = VersionId::next_after(existing.first().map(|v| &v.id), self.clock.now(), file_name);
        let path = self.paths.version_file(&id.to_file_name());

        AtomicFile::new(&path).write_bytes(&bytes).await?;

        tracing::debug!(content_type, version = %id.to_file_name(), "Archived previous content");
        Ok(Some(Version {
            content_type: content_type.to_string(),
            id,
            path,
        }))
    }

    /// Deletes versions beyond the retention window. Individual delete
    /// failures are logged and skipped; returns how many were removed.
    async fn enforce_retention(&self, content_type: &str, file_name: &str) -> Result<usize> {
        let versions = self.scan_versions(content_type, file_name).await?;
        let mut removed = 0;

        for version in versions.iter().skip(self.retention) {
            match fs::remove_file(&version.path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    content_type,
                    version = %version.file_name(),
                    error = %e,
                    "Failed to prune old version"
                ),
            }
        }

        if removed > 0 {
            tracing::debug!(content_type, removed, "Pruned versions beyond retention window");
        }
        Ok(removed)
    }

    /// Validates a caller-supplied version id for `file_name`.
    fn parse_version_id(&self, content_type: &str, file_name: &str, version_id: &str) -> Result<VersionId> {
        let id = VersionId::parse(version_id)
            .ok_or_else(|| FolioError::InvalidVersionId(version_id.to_string()))?;
        if id.file_name != file_name {
            return Err(FolioError::version_not_found(content_type, version_id));
        }
        Ok(id)
    }

    /// Loads a version's raw bytes and checks they still parse as JSON.
    async fn load_version_bytes(
        &self,
        content_type: &str,
        file_name: &str,
        version_id: &str,
    ) -> Result<(Vec<u8>, Value)> {
        let id = self.parse_version_id(content_type, file_name, version_id)?;
        let file = AtomicFile::new(self.paths.version_file(&id.to_file_name()));

        let bytes = file
            .load_bytes()
            .await?
            .ok_or_else(|| FolioError::version_not_found(content_type, version_id))?;

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| FolioError::corrupt_version(version_id, e.to_string()))?;

        Ok((bytes, value))
    }
}

#[async_trait]
impl VersionedStore for FsVersionedStore {
    async fn write(&self, content_type: &str, payload: &Value) -> Result<VersionInfo> {
        let file_name = self.registry.resolve(content_type)?;
        let bytes = serde_json::to_vec_pretty(payload)?;

        let lock = self.lock_for(content_type).await;
        let _guard = lock.lock().await;

        best_effort(
            "archive_current",
            content_type,
            self.archive_current(content_type, file_name),
        )
        .await;

        let written_at = self.clock.now();
        AtomicFile::new(self.paths.content_file(file_name))
            .write_bytes(&bytes)
            .await
            .map_err(|e| {
                tracing::error!(content_type, error = %e, "Canonical content write failed");
                FolioError::storage_write(format!("{}: {}", file_name, e))
            })?;

        best_effort(
            "enforce_retention",
            content_type,
            self.enforce_retention(content_type, file_name),
        )
        .await;

        tracing::info!(content_type, file = file_name, "Content written");
        Ok(VersionInfo {
            content_type: content_type.to_string(),
            file_name: file_name.to_string(),
            written_at,
        })
    }

    async fn list_versions(&self, content_type: &str) -> Result<Vec<Version>> {
        let file_name = self.registry.resolve(content_type)?;
        self.scan_versions(content_type, file_name).await
    }

    async fn restore(&self, content_type: &str, version_id: &str) -> Result<VersionInfo> {
        let file_name = self.registry.resolve(content_type)?;

        let lock = self.lock_for(content_type).await;
        let _guard = lock.lock().await;

        let (bytes, _) = self
            .load_version_bytes(content_type, file_name, version_id)
            .await?;

        // Losing the pre-restore state is not acceptable, so unlike a plain
        // write this snapshot is fatal on failure.
        self.archive_current(content_type, file_name)
            .await
            .map_err(|e| {
                FolioError::storage_write(format!(
                    "could not snapshot current {} before restore: {}",
                    file_name, e
                ))
            })?;

        let written_at = self.clock.now();
        AtomicFile::new(self.paths.content_file(file_name))
            .write_bytes(&bytes)
            .await
            .map_err(|e| {
                tracing::error!(content_type, version_id, error = %e, "Restore write failed");
                FolioError::storage_write(format!("{}: {}", file_name, e))
            })?;

        best_effort(
            "enforce_retention",
            content_type,
            self.enforce_retention(content_type, file_name),
        )
        .await;

        tracing::info!(content_type, version_id, "Content restored");
        Ok(VersionInfo {
            content_type: content_type.to_string(),
            file_name: file_name.to_string(),
            written_at,
        })
    }

    async fn read_current(&self, content_type: &str) -> Result<Value> {
        let file_name = self.registry.resolve(content_type)?;
        AtomicFile::new(self.paths.content_file(file_name))
            .load_json()
            .await?
            .ok_or_else(|| FolioError::ContentNotFound(content_type.to_string()))
    }

    async fn read_version(&self, content_type: &str, version_id: &str) -> Result<Value> {
        let file_name = self.registry.resolve(content_type)?;
        let (_, value) = self
            .load_version_bytes(content_type, file_name, version_id)
            .await?;
        Ok(value)
    }
}
