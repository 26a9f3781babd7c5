//! Error types for Folio.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level complaint produced by a content validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// JSON path of the offending field (`$` for the document root)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A shared error type for the whole Folio workspace.
///
/// Variants map one-to-one onto the failure classes an admin caller can
/// observe. Housekeeping failures (backup copies, retention cleanup) never
/// appear here; they are logged by the component that swallowed them.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FolioError {
    /// Username/password pair was rejected
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No token, or a token that names no live session
    #[error("Authentication required")]
    Unauthenticated,

    /// The session existed but sat idle past the timeout
    #[error("Session expired")]
    SessionExpired,

    /// Password change attempted with the wrong current password. The
    /// session itself is still valid.
    #[error("Current password is incorrect")]
    CurrentPasswordMismatch,

    /// Replacement password does not meet the minimum length
    #[error("Password must be at least {min_length} characters")]
    WeakCredential { min_length: usize },

    /// Content-type key missing from the registry
    #[error("Unknown content type: '{0}'")]
    UnknownContentType(String),

    /// Registered content type that has never been written
    #[error("No content stored yet for '{0}'")]
    ContentNotFound(String),

    /// Payload rejected by the content validator
    #[error("Validation failed ({} field error(s))", .0.len())]
    Validation(Vec<FieldError>),

    /// The canonical write itself failed; the only fatal storage failure
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// Version identifier is not a well-formed version file name
    #[error("Invalid version id: '{0}'")]
    InvalidVersionId(String),

    /// No archived version by that name exists for the content type
    #[error("Version not found: {content_type} '{version_id}'")]
    VersionNotFound {
        content_type: String,
        version_id: String,
    },

    /// Archived version no longer parses as JSON
    #[error("Version '{version_id}' is corrupt: {message}")]
    CorruptVersion { version_id: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FolioError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn unknown_content_type(content_type: impl Into<String>) -> Self {
        Self::UnknownContentType(content_type.into())
    }

    pub fn version_not_found(content_type: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self::VersionNotFound {
            content_type: content_type.into(),
            version_id: version_id.into(),
        }
    }

    pub fn corrupt_version(version_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptVersion {
            version_id: version_id.into(),
            message: message.into(),
        }
    }

    pub fn storage_write(message: impl Into<String>) -> Self {
        Self::StorageWrite(message.into())
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    /// A request body that is not JSON at all, reported against the root.
    pub fn malformed_body(err: &serde_json::Error) -> Self {
        Self::Validation(vec![FieldError::new(
            "$",
            format!("invalid JSON body: {}", err),
        )])
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// True for both "never logged in" and "timed out".
    ///
    /// Callers outside the session layer should branch on this rather than
    /// on the individual variants so the two stay indistinguishable.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionExpired)
    }

    /// Stable machine-readable kind, used as the `error` field of API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            // Expired and unknown sessions share one public kind
            Self::Unauthenticated | Self::SessionExpired => "unauthenticated",
            Self::CurrentPasswordMismatch => "current_password_mismatch",
            Self::WeakCredential { .. } => "weak_credential",
            Self::UnknownContentType(_) => "unknown_content_type",
            Self::ContentNotFound(_) => "content_not_found",
            Self::Validation(_) => "validation_error",
            Self::StorageWrite(_) => "storage_write_error",
            Self::InvalidVersionId(_) => "invalid_version",
            Self::VersionNotFound { .. } => "version_not_found",
            Self::CorruptVersion { .. } => "corrupt_version",
            Self::Io { .. } => "io_error",
            Self::Serialization { .. } => "serialization_error",
            Self::Config(_) => "config_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for FolioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FolioError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (binaries hand these back at the edge)
impl From<anyhow::Error> for FolioError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, FolioError>`.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_and_unauthenticated_share_kind() {
        assert_eq!(FolioError::SessionExpired.kind(), FolioError::Unauthenticated.kind());
        assert!(FolioError::SessionExpired.is_auth_failure());
        assert!(FolioError::Unauthenticated.is_auth_failure());
        assert!(!FolioError::InvalidCredentials.is_auth_failure());
    }

    #[test]
    fn test_current_password_mismatch_is_not_an_auth_failure() {
        assert!(!FolioError::CurrentPasswordMismatch.is_auth_failure());
        assert_ne!(
            FolioError::CurrentPasswordMismatch.kind(),
            FolioError::InvalidCredentials.kind()
        );
    }

    #[test]
    fn test_malformed_body_points_at_root() {
        let parse_err = serde_json::from_slice::<serde_json::Value>(b"{ broken").unwrap_err();
        match FolioError::malformed_body(&parse_err) {
            FolioError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "$");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let err: FolioError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        match err {
            FolioError::Io { message } => assert!(message.contains("PermissionDenied")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_message_counts_fields() {
        let err = FolioError::validation(vec![
            FieldError::new("$.title", "must not be empty"),
            FieldError::new("$.items", "must be an array"),
        ]);
        assert_eq!(err.to_string(), "Validation failed (2 field error(s))");
    }
}
