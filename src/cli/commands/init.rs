//! Init command - first-run setup.

use crate::cli::preflight::{check_tool, install_hint};
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::{Path, PathBuf};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    Output::header("docqa Setup");
    println!();

    // Step 1: Check prerequisites
    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let missing: Vec<&str> = [settings.pdf.command.as_str(), "ffmpeg", "ffprobe"]
        .into_iter()
        .filter(|tool| check_tool(tool).is_err())
        .collect();

    if missing.is_empty() {
        Output::success("All required tools are installed!");
    } else {
        Output::warning("Some tools are missing. Uploads that need them will fail:");
        println!();
        for tool in &missing {
            println!("  {} {} - not found", style("✗").red(), style(tool).bold());
            println!("    {} {}", style("→").dim(), style(install_hint(tool)).dim());
        }
    }

    println!();

    // Step 2: Check API key
    println!("{}", style("Step 2: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("OPENAI_API_KEY").map_or(true, |k| k.is_empty()) {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  docqa requires an OpenAI API key for transcription, embeddings and answers.");
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 3: Create directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    for (label, dir) in [
        ("Data directory", settings.data_dir()),
        ("Temp directory", settings.temp_dir()),
        ("Vector store", settings.vector_dir()),
    ] {
        ensure_dir(label, &dir)?;
    }

    println!();

    // Step 4: Create config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = config_path
        .cloned()
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("docqa doctor").cyan());
    println!("  {} Index a PDF or video", style("docqa ingest <path>").cyan());
    println!("  {} Start the HTTP API", style("docqa serve").cyan());
    println!("  {} Ask questions about your content", style("docqa ask \"<question>\"").cyan());
    println!();
    println!("For more help: {}", style("docqa --help").cyan());

    Ok(())
}

fn ensure_dir(label: &str, dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        Output::info(&format!("{} exists: {}", label, dir.display()));
    } else {
        std::fs::create_dir_all(dir)?;
        Output::success(&format!("Created {}: {}", label.to_lowercase(), dir.display()));
    }
    Ok(())
}
