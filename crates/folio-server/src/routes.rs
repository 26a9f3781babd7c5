//! Route definitions for the admin and public API.

use crate::AppState;
use crate::handlers;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

/// Session-gated admin routes (login itself excepted)
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/auth/login", post(handlers::login))
        .route("/admin/auth/logout", post(handlers::logout))
        .route("/admin/auth/change-password", post(handlers::change_password))
        .route("/admin/content/:type", post(handlers::mutate))
        .route("/admin/backups/:type", get(handlers::list_backups))
        .route("/admin/backups/:type/:version_id", get(handlers::read_backup))
        .route("/admin/restore/:type/:version_id", post(handlers::restore))
        .route("/admin/status", get(handlers::status))
}

/// Unauthenticated routes used by page loaders
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/content/update-status/:type", get(handlers::update_status))
        .route("/content/:type", get(handlers::read_content))
}
