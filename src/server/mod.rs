//! HTTP API server.
//!
//! Upload, query, listing, download and inline-view endpoints over the
//! ingestion pipeline. All API routes live under `/api`; `/health` is at the
//! root.

mod error;
mod handlers;
pub mod range;
#[cfg(test)]
mod tests;

pub use error::{ApiError, ErrorBody};
pub use handlers::{HealthResponse, ListResponse, QueryRequest, QueryResponse, UploadResponse};

use crate::orchestrator::Orchestrator;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use range::RangeParser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub range_parser: RangeParser,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            range_parser: RangeParser::new(),
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.orchestrator.settings().server.max_upload_mb * 1024 * 1024;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/upload-documents", post(handlers::upload_document))
        .route("/upload-videos", post(handlers::upload_video))
        .route("/query", post(handlers::query))
        .route("/documents", get(handlers::list_documents))
        .route("/documents/{id}/download", get(handlers::download_document))
        .route("/documents/{id}/view", get(handlers::view_document))
        .route("/videos", get(handlers::list_videos))
        .route("/videos/{id}/download", get(handlers::download_video))
        .route("/videos/{id}/view", get(handlers::view_video));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> crate::error::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
