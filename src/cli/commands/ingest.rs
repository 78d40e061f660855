//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::storage::FileKind;
use anyhow::{bail, Result};
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &str, settings: Settings) -> Result<()> {
    let path = Path::new(path);
    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let Some((kind, _)) = FileKind::from_extension(ext) else {
        bail!("Unsupported file type: {} (expected a PDF or a video)", path.display());
    };

    if let Err(e) = preflight::check(Operation::Ingest(kind), &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let action = match kind {
        FileKind::Document => "Converting and indexing document...",
        FileKind::Video => "Transcribing and indexing video...",
    };
    let spinner = Output::spinner(action);

    match orchestrator.ingest_path(path).await {
        Ok(result) => {
            spinner.finish_and_clear();
            Output::success(&format!("Ingested {} {}", kind, result.file_name));
            Output::kv("Id", &result.id.to_string());
            Output::kv("Chunks indexed", &result.chunks_indexed.to_string());
            if result.chunks_indexed == 0 {
                Output::warning("No text long enough to index was found in this file.");
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to ingest {}: {}", path.display(), e));
            return Err(e.into());
        }
    }

    Ok(())
}
