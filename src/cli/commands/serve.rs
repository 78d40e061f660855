//! HTTP API server command.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::server::{self, AppState};
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check_api_key() {
        Output::warning(&format!("{}", e));
    }
    for (tool, present) in preflight::server_tools(&settings) {
        if !present {
            Output::warning(&format!(
                "{} not found; uploads that need it will fail. {}",
                tool,
                preflight::install_hint(&tool)
            ));
        }
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let indexed = orchestrator.indexed_chunks().await;
    let state = Arc::new(AppState::new(orchestrator));

    Output::header("docqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    Output::kv("Indexed chunks", &indexed.to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Upload PDF", "POST /api/upload-documents");
    Output::kv("Upload video", "POST /api/upload-videos");
    Output::kv("Query", "POST /api/query");
    Output::kv("Documents", "GET  /api/documents[/{id}/download|view]");
    Output::kv("Videos", "GET  /api/videos[/{id}/download|view]");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    server::serve(state, &host, port).await?;

    Ok(())
}
