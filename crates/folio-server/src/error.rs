//! HTTP mapping for `FolioError`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_core::{FieldError, FolioError};
use serde::Serialize;

/// JSON error body: `{error, message, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// A `FolioError` on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub FolioError);

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// Expired and unknown sessions share 401 so callers cannot tell a
    /// timed-out session from one that never existed.
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            FolioError::InvalidCredentials
            | FolioError::Unauthenticated
            | FolioError::SessionExpired => StatusCode::UNAUTHORIZED,
            FolioError::CurrentPasswordMismatch
            | FolioError::WeakCredential { .. }
            | FolioError::Validation(_)
            | FolioError::InvalidVersionId(_)
            | FolioError::CorruptVersion { .. } => StatusCode::BAD_REQUEST,
            FolioError::UnknownContentType(_)
            | FolioError::ContentNotFound(_)
            | FolioError::VersionNotFound { .. } => StatusCode::NOT_FOUND,
            FolioError::StorageWrite(_)
            | FolioError::Io { .. }
            | FolioError::Serialization { .. }
            | FolioError::Config(_)
            | FolioError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let message = if self.status_code().is_server_error() {
            // Paths and OS errors stay in the log
            "Internal server error".to_string()
        } else if self.0.is_auth_failure() {
            // Same text for expired and unknown sessions
            FolioError::Unauthenticated.to_string()
        } else {
            self.0.to_string()
        };
        let details = match &self.0 {
            FolioError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };
        ErrorBody {
            error: self.0.kind(),
            message,
            details,
        }
    }
}

impl From<FolioError> for ApiError {
    fn from(err: FolioError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
