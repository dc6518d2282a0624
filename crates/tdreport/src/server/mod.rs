//! HTTP surface for tdreport.
//!
//! Routes requests to the report store and serves the static form assets.
//! Handlers only shape requests and responses; every failure is answered
//! with `{"success": false, "message": ...}`.

mod handlers;
mod response;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{ReportRepository, ReportStore};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Report persistence.
    pub reports: Arc<dyn ReportRepository>,
    /// Directory holding the static form assets.
    pub public_dir: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create state with the default body limit.
    #[must_use]
    pub fn new(reports: Arc<dyn ReportRepository>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports,
            public_dir: public_dir.into(),
            max_body_bytes: crate::config::ServerConfig::default().max_body_bytes,
        }
    }

    /// Create state from the `[server]` configuration section.
    #[must_use]
    pub fn from_config(config: &Config, reports: Arc<dyn ReportRepository>) -> Self {
        Self {
            reports,
            public_dir: config.server.public_dir.clone(),
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/api/simpan-laporan", post(handlers::save_report_handler))
        .route("/api/laporan", get(handlers::list_reports_handler))
        .route(
            "/api/laporan/download/:filename",
            get(handlers::download_report_handler),
        )
        .fallback(handlers::static_asset_handler)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}

/// Run the server until Ctrl-C.
///
/// Creates the activity log directory, binds the configured address and
/// serves the router built from `store`.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(config: &Config, store: ReportStore) -> Result<()> {
    // A missing logs directory only costs activity log lines
    if let Err(err) = store.activity().init().await {
        error!("Error creating logs directory: {err}");
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("TD form server ready");
    info!("URL: http://{addr}");
    info!("Public folder: {}", config.server.public_dir.display());
    info!("Reports: {}", store.dir().display());
    info!("Logs: {}", store.activity().dir().display());

    let app = build_router(AppState::from_config(config, Arc::new(store)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
