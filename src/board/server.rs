use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use chrono::Utc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::api::{self, AppState, BoardSettings, SharedState};
use super::db::{BoardDb, DbHandle};
use super::pages;
use super::ws::WsEvent;
use crate::config::PlanboardConfig;

/// Capacity of the realtime fan-out channel.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the board server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub dev_mode: bool,
    pub settings: BoardSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3141,
            db_path: PathBuf::from(".planboard/planboard.db"),
            dev_mode: false,
            settings: BoardSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_config(config: &PlanboardConfig) -> Self {
        let toml = &config.toml;
        Self {
            host: toml.server.host.clone(),
            port: toml.server.port,
            db_path: config.db_path().to_path_buf(),
            dev_mode: toml.server.dev_mode,
            settings: BoardSettings::from_config(toml),
        }
    }
}

/// Open (creating and migrating if needed) the database at `path`.
pub fn open_database(path: &Path) -> Result<BoardDb> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    BoardDb::new(path).context("Failed to initialize board database")
}

/// Build the full application router: API, WebSocket and page routes.
pub fn build_router(state: SharedState, dev_mode: bool) -> Router {
    let mut app = api::api_router()
        .merge(pages::page_router())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if dev_mode {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Start the board server and run until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let db = open_database(&config.db_path)?;
    let purged = db.purge_expired_sessions(Utc::now())?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired sessions");
    }

    let (ws_tx, _rx) = broadcast::channel::<WsEvent>(WS_CHANNEL_CAPACITY);
    let state = Arc::new(AppState {
        db: DbHandle::new(db),
        ws_tx,
        settings: config.settings,
    });

    let app = build_router(state, config.dev_mode);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        db = %config.db_path.display(),
        dev_mode = config.dev_mode,
        "Planboard running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
