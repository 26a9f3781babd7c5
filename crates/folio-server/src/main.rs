//! Folio Server - admin API for a content-managed site
//!
//! Serves session-gated content mutation with automatic versioning, plus
//! the unauthenticated read and update-polling endpoints page loaders use.
//!
//! # Usage
//!
//! ```bash
//! # Start on the configured (or default 8080) port
//! folio-server
//!
//! # Explicit config file, site root and port
//! folio-server --config /etc/folio.toml --root-dir /srv/site --port 9000
//! ```
//!
//! # Endpoints
//!
//! - `POST /admin/auth/login` - Issue a session token
//! - `POST /admin/auth/logout` - End the session
//! - `POST /admin/auth/change-password` - Replace the caller's password
//! - `POST /admin/content/:type` - Replace a content record
//! - `GET /admin/backups/:type` - Archived versions, newest first
//! - `GET /admin/backups/:type/:versionId` - Content of one archived version
//! - `POST /admin/restore/:type/:versionId` - Make a version current again
//! - `GET /admin/status` - Active sessions and last update per type
//! - `GET /content/:type` - Current content
//! - `GET /content/update-status/:type?lastUpdate=<ms>` - Change polling
//! - `GET /health` - Health check

mod error;
mod handlers;
mod routes;

#[cfg(test)]
mod test_http_api;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use folio_application::ContentGateway;
use folio_core::auth::SessionManager;
use folio_core::change_feed::ChangeFeed;
use folio_core::clock::{Clock, SystemClock};
use folio_core::config::FolioConfig;
use folio_core::content::StructuralValidator;
use folio_infrastructure::{ConfigService, FolioPaths, FsVersionedStore, JsonCredentialStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Folio admin API server
#[derive(Parser, Debug)]
#[command(name = "folio-server")]
#[command(about = "Folio admin API server")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to ./folio.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Site root holding data/, backups/ and credentials.json
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// Bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// HTTP server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply_to(&self, config: &mut FolioConfig) {
        if let Some(root_dir) = &self.root_dir {
            config.root_dir = root_dir.clone();
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// Shared application state
pub struct AppState {
    gateway: ContentGateway,
}

impl AppState {
    /// Wires storage, credentials, sessions and the change feed together.
    async fn from_config(config: &FolioConfig) -> folio_core::Result<Self> {
        let paths = FolioPaths::new(&config.root_dir);
        let registry = Arc::new(config.registry()?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store = FsVersionedStore::with_retention(
            paths.clone(),
            registry.clone(),
            clock.clone(),
            config.retention,
        )
        .await?;

        let credentials =
            JsonCredentialStore::open(paths.credentials_file(), &config.admins).await?;

        let sessions = SessionManager::with_timeout(
            Arc::new(credentials),
            clock,
            config.session_timeout()?,
        );

        let gateway = ContentGateway::new(
            Arc::new(sessions),
            Arc::new(store),
            Arc::new(StructuralValidator::default()),
            Arc::new(ChangeFeed::new()),
        );

        info!(
            root = %paths.root().display(),
            content_types = registry.keys().count(),
            retention = config.retention,
            "Site storage ready"
        );
        Ok(Self { gateway })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = ConfigService::new(args.config.clone())
        .load()
        .await
        .context("Failed to load configuration")?;
    args.apply_to(&mut config);

    let state = Arc::new(
        AppState::from_config(&config)
            .await
            .context("Failed to initialize site storage")?,
    );

    spawn_session_sweeper(state.clone());

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    info!("Folio Server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::admin_routes())
        .merge(routes::public_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drops idle sessions that nobody tried to use again.
fn spawn_session_sweeper(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            state.gateway.sessions().purge_expired().await;
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
