//! HTTP request handlers for the admin and public API.

use crate::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use folio_application::{BackupEntry, MutationOutcome, RestoreOutcome, SiteStatus};
use folio_core::FolioError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Parses a request body, reporting malformed JSON as a `$` field error.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError(FolioError::malformed_body(&e)))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusQuery {
    pub last_update: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub has_update: bool,
    pub timestamp: Option<i64>,
    pub content_type: String,
}

/// POST /admin/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let request: LoginRequest = parse_body(&body)?;
    let token = state
        .gateway
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(LoginResponse { token }))
}

/// POST /admin/auth/logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    state.gateway.logout(bearer_token(&headers)).await;
    StatusCode::NO_CONTENT
}

/// POST /admin/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request: ChangePasswordRequest = parse_body(&body)?;
    state
        .gateway
        .change_password(
            bearer_token(&headers),
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/content/:type
pub async fn mutate(
    State(state): State<Arc<AppState>>,
    Path(content_type): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MutationOutcome>, ApiError> {
    let outcome = state
        .gateway
        .mutate(bearer_token(&headers), &content_type, &body)
        .await?;
    Ok(Json(outcome))
}

/// GET /content/update-status/:type?lastUpdate=<epochMillis>
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(content_type): Path<String>,
    Query(query): Query<UpdateStatusQuery>,
) -> Json<UpdateStatusResponse> {
    let status = state
        .gateway
        .check_for_update(&content_type, query.last_update.unwrap_or(0))
        .await;
    Json(UpdateStatusResponse {
        has_update: status.has_update,
        timestamp: status.timestamp,
        content_type,
    })
}

/// GET /content/:type
pub async fn read_content(
    State(state): State<Arc<AppState>>,
    Path(content_type): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.gateway.read_content(&content_type).await?))
}

/// GET /admin/backups/:type
pub async fn list_backups(
    State(state): State<Arc<AppState>>,
    Path(content_type): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<BackupEntry>>, ApiError> {
    let backups = state
        .gateway
        .list_backups(bearer_token(&headers), &content_type)
        .await?;
    Ok(Json(backups))
}

/// GET /admin/backups/:type/:versionId
pub async fn read_backup(
    State(state): State<Arc<AppState>>,
    Path((content_type, version_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let content = state
        .gateway
        .read_backup(bearer_token(&headers), &content_type, &version_id)
        .await?;
    Ok(Json(content))
}

/// GET /admin/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SiteStatus>, ApiError> {
    Ok(Json(state.gateway.status(bearer_token(&headers)).await?))
}

/// POST /admin/restore/:type/:versionId
pub async fn restore(
    State(state): State<Arc<AppState>>,
    Path((content_type, version_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<RestoreOutcome>, ApiError> {
    let outcome = state
        .gateway
        .restore(bearer_token(&headers), &content_type, &version_id)
        .await?;
    Ok(Json(outcome))
}

/// GET /health
pub async fn health() -> Response {
    let body = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("bearer  abc123 ")), Some("abc123"));
        assert_eq!(bearer_token(&headers_with("Basic abc123")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
