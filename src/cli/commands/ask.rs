//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(query: &str, top_k: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docqa doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching knowledge base...");

    match orchestrator.query(query).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in response.sources.iter().enumerate() {
                    Output::source(i + 1, source.distance, &source.entry.text);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
