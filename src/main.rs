//! docqa CLI entry point.

use anyhow::Result;
use clap::Parser;
use docqa::cli::{commands, Cli, Commands};
use docqa::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docqa={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings, config_path.as_ref())?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path.as_ref())?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Ingest { path } => {
            commands::run_ingest(path, settings).await?;
        }

        Commands::Ask { query, top_k } => {
            commands::run_ask(query, *top_k, settings).await?;
        }

        Commands::List {
            videos,
            page,
            page_size,
        } => {
            commands::run_list(*videos, *page, *page_size, settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, config_path.as_ref())?;
        }
    }

    Ok(())
}
