//! Content gateway use case.
//!
//! `ContentGateway` is the single entry point the admin API talks to. Every
//! mutating operation is an explicit pipeline:
//!
//! ```text
//! mutate:  validate session → parse body → sanitize/validate → store.write → feed.record
//! restore: validate session → store.restore → feed.record
//! ```
//!
//! A failed step aborts the pipeline and nothing already done is rolled
//! back. The store is the source of truth; the feed only advertises it.

use chrono::{DateTime, Utc};
use folio_core::auth::SessionManager;
use folio_core::{FolioError, Result};
use folio_core::change_feed::{ChangeFeed, UpdateStatus};
use folio_core::content::{ContentValidator, Version, VersionInfo, VersionedStore};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of a successful content mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome {
    #[serde(rename = "type")]
    pub content_type: String,
    pub file_name: String,
    pub updated_at: DateTime<Utc>,
}

impl From<VersionInfo> for MutationOutcome {
    fn from(info: VersionInfo) -> Self {
        Self {
            content_type: info.content_type,
            file_name: info.file_name,
            updated_at: info.written_at,
        }
    }
}

/// One archived version as shown in a backup listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    /// Version identifier, usable with `restore`
    pub file_name: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Version> for BackupEntry {
    fn from(version: &Version) -> Self {
        let created_at = version.timestamp();
        Self {
            file_name: version.file_name(),
            timestamp: created_at.timestamp_millis(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    #[serde(rename = "type")]
    pub content_type: String,
    pub restored_from: String,
    pub restored_at: DateTime<Utc>,
}

/// Admin diagnostics: live sessions and the change-feed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub active_sessions: usize,
    /// Last write per content type, epoch milliseconds
    pub last_updates: BTreeMap<String, i64>,
}

/// Coordinates sessions, storage, validation and change notification.
///
/// All collaborators are shared through `Arc`, so one gateway can be cloned
/// into every request handler.
#[derive(Clone)]
pub struct ContentGateway {
    sessions: Arc<SessionManager>,
    store: Arc<dyn VersionedStore>,
    validator: Arc<dyn ContentValidator>,
    feed: Arc<ChangeFeed>,
}

impl ContentGateway {
    pub fn new(
        sessions: Arc<SessionManager>,
        store: Arc<dyn VersionedStore>,
        validator: Arc<dyn ContentValidator>,
        feed: Arc<ChangeFeed>,
    ) -> Self {
        Self {
            sessions,
            store,
            validator,
            feed,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    // ============================================================================
    // Authentication
    // ============================================================================

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        self.sessions.issue(username, password).await
    }

    /// Ends the session behind `token`. Missing or unknown tokens are a no-op.
    pub async fn logout(&self, token: Option<&str>) {
        if let Some(token) = token {
            self.sessions.revoke(token).await;
        }
    }

    pub async fn change_password(
        &self,
        token: Option<&str>,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        self.sessions
            .change_credential(token, current_password, new_password)
            .await
    }

    // ============================================================================
    // Content
    // ============================================================================

    /// Replaces the content of `content_type` with the sanitized JSON in
    /// `body`. The session is checked before the body is parsed.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `SessionExpired`: no valid session
    /// - `Validation`: body not JSON, or payload rejected; nothing written
    /// - `UnknownContentType`: type not registered
    /// - `StorageWrite`: canonical write failed; no feed event recorded
    pub async fn mutate(
        &self,
        token: Option<&str>,
        content_type: &str,
        body: &[u8],
    ) -> Result<MutationOutcome> {
        let session = self.sessions.validate(token).await?;

        let raw: Value =
            serde_json::from_slice(body).map_err(|e| FolioError::malformed_body(&e))?;

        let sanitized = self
            .validator
            .sanitize_and_validate(content_type, raw)
            .map_err(|e| {
                tracing::debug!(content_type, error = %e, "Payload rejected by validator");
                e
            })?;

        let info = self.store.write(content_type, &sanitized).await?;

        self.feed
            .record(content_type, info.written_at.timestamp_millis())
            .await;

        tracing::info!(
            content_type,
            username = %session.username,
            "Content updated"
        );
        Ok(info.into())
    }

    /// Polling endpoint for page loaders. Needs no session.
    pub async fn check_for_update(&self, content_type: &str, since: i64) -> UpdateStatus {
        self.feed.query(content_type, since).await
    }

    /// Current content of `content_type`. Needs no session.
    pub async fn read_content(&self, content_type: &str) -> Result<Value> {
        self.store.read_current(content_type).await
    }

    /// Archived versions of `content_type`, newest first.
    pub async fn list_backups(
        &self,
        token: Option<&str>,
        content_type: &str,
    ) -> Result<Vec<BackupEntry>> {
        self.sessions.validate(token).await?;
        let versions = self.store.list_versions(content_type).await?;
        Ok(versions.iter().map(BackupEntry::from).collect())
    }

    /// Content of one archived version.
    pub async fn read_backup(
        &self,
        token: Option<&str>,
        content_type: &str,
        version_id: &str,
    ) -> Result<Value> {
        self.sessions.validate(token).await?;
        self.store.read_version(content_type, version_id).await
    }

    /// Live session count and the last recorded write per content type.
    pub async fn status(&self, token: Option<&str>) -> Result<SiteStatus> {
        self.sessions.validate(token).await?;
        let last_updates = self
            .feed
            .snapshot()
            .await
            .into_iter()
            .map(|(content_type, event)| (content_type, event.timestamp))
            .collect();
        Ok(SiteStatus {
            active_sessions: self.sessions.active_sessions().await,
            last_updates,
        })
    }

    /// Makes an archived version current again.
    ///
    /// The pre-restore content is archived by the store, and the restore is
    /// advertised on the change feed like any other content change.
    pub async fn restore(
        &self,
        token: Option<&str>,
        content_type: &str,
        version_id: &str,
    ) -> Result<RestoreOutcome> {
        let session = self.sessions.validate(token).await?;

        let info = self.store.restore(content_type, version_id).await?;

        self.feed
            .record(content_type, info.written_at.timestamp_millis())
            .await;

        tracing::info!(
            content_type,
            version_id,
            username = %session.username,
            "Content restored from version"
        );
        Ok(RestoreOutcome {
            content_type: info.content_type,
            restored_from: version_id.to_string(),
            restored_at: info.written_at,
        })
    }
}
