//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{DocqaError, Result};
use crate::storage::FileKind;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingesting needs the API key plus the converter for the file kind.
    Ingest(FileKind),
    /// Asking questions requires the API key.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_api_key()?;
    match operation {
        Operation::Ingest(FileKind::Document) => {
            check_tool(&settings.pdf.command)?;
        }
        Operation::Ingest(FileKind::Video) => {
            check_tool("ffmpeg")?;
            check_tool("ffprobe")?;
        }
        Operation::Ask => {}
    }
    Ok(())
}

/// Tools the server needs at some point, paired with whether each is present.
pub fn server_tools(settings: &Settings) -> Vec<(String, bool)> {
    [settings.pdf.command.as_str(), "ffmpeg", "ffprobe"]
        .into_iter()
        .map(|tool| (tool.to_string(), check_tool(tool).is_ok()))
        .collect()
}

/// Check if OpenAI API key is configured.
pub fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(DocqaError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(DocqaError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Arguments that make a tool print its version and exit successfully.
pub fn version_args(name: &str) -> &'static [&'static str] {
    match name {
        "ffmpeg" | "ffprobe" => &["-version"],
        // poppler's pdftotext prints its version with -v
        _ if name.ends_with("pdftotext") => &["-v"],
        _ => &["--version"],
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).args(version_args(name)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(DocqaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DocqaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(DocqaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// Platform-specific install hint.
pub fn install_hint(tool: &str) -> &'static str {
    match tool {
        "ffmpeg" | "ffprobe" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install ffmpeg"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install ffmpeg (or your package manager)"
            } else {
                "Install from: https://ffmpeg.org/download.html"
            }
        }
        t if t.ends_with("pdftotext") => {
            if cfg!(target_os = "macos") {
                "Install with: brew install poppler"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install poppler-utils (or your package manager)"
            } else {
                "Install poppler and make sure pdftotext is on your PATH"
            }
        }
        _ => "Check the documentation for installation instructions",
    }
}
