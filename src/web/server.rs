//! Axum web server for the transfer UI.
//!
//! Connection details travel with every request; the server keeps no
//! per-client state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Settings;
use crate::database::ClickHouseConnectionFactory;
use crate::transfer::{Orchestrator, TransferOptions};

use super::handlers;

/// Application state shared across handlers.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Directory uploads are staged in for the length of a request.
    pub upload_dir: PathBuf,
    /// Delimiter used when a request does not name one.
    pub default_delimiter: String,
}

impl AppState {
    /// Build state from settings, connecting to ClickHouse over HTTP.
    pub fn from_settings(settings: &Settings) -> Result<Self, Box<dyn std::error::Error>> {
        let factory =
            ClickHouseConnectionFactory::new(Duration::from_secs(settings.clickhouse.timeout_secs))?;
        Ok(Self {
            orchestrator: Orchestrator::new(
                Arc::new(factory),
                TransferOptions::from_settings(&settings.transfer)?,
            ),
            upload_dir: settings.transfer.resolved_upload_dir()?,
            default_delimiter: settings.transfer.default_delimiter.clone(),
        })
    }
}

/// Build the axum router with all routes.
pub fn router(state: Arc<AppState>, upload_limit_mb: usize, cors: bool) -> Router {
    let app = Router::new()
        // Database routes
        .route("/api/clickhouse/connect", post(handlers::connect))
        .route("/api/clickhouse/columns", post(handlers::columns))
        .route(
            "/api/clickhouse/export/preview",
            post(handlers::export_preview),
        )
        .route("/api/clickhouse/export", post(handlers::export))
        // Flat-file routes
        .route("/api/flatfile/schema", post(handlers::flatfile_schema))
        .route("/api/flatfile/preview", post(handlers::flatfile_preview))
        .route("/api/flatfile/import", post(handlers::flatfile_import))
        // Export downloads
        .route("/downloads/{name}", get(handlers::download))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(upload_limit_mb.saturating_mul(1024 * 1024)))
        .with_state(state);

    if cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Start the web server.
pub async fn serve(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_settings(&settings)?);
    let holding_dir = state.orchestrator.options().holding_dir.clone();
    let app = router(state, settings.server.upload_limit_mb, settings.server.cors);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        %addr,
        holding_dir = %holding_dir.display(),
        "flatbridge server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
