//! PDF conversion through poppler's `pdftotext`.

use super::PdfConverter;
use crate::config::PdfSettings;
use crate::error::{DocqaError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs an external `pdftotext`-compatible converter and reads its stdout.
pub struct PdftotextConverter {
    command: String,
    layout: bool,
}

impl PdftotextConverter {
    pub fn new(settings: &PdfSettings) -> Self {
        Self {
            command: settings.command.clone(),
            layout: settings.layout,
        }
    }

    fn args(&self, pdf_path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if self.layout {
            args.push("-layout".to_string());
        }
        args.extend(["-enc".to_string(), "UTF-8".to_string()]);
        args.push(pdf_path.to_string_lossy().into_owned());
        // write to stdout
        args.push("-".to_string());
        args
    }
}

impl Default for PdftotextConverter {
    fn default() -> Self {
        Self::new(&PdfSettings::default())
    }
}

#[async_trait]
impl PdfConverter for PdftotextConverter {
    #[instrument(skip(self), fields(pdf_path = %pdf_path.display()))]
    async fn convert(&self, pdf_path: &Path) -> Result<String> {
        let result = Command::new(&self.command)
            .args(self.args(pdf_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocqaError::ToolNotFound(self.command.clone()));
            }
            Err(e) => {
                return Err(DocqaError::ToolFailed(format!("{} execution failed: {e}", self.command)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocqaError::Extraction(format!(
                "{} failed: {}",
                self.command,
                stderr.trim()
            )));
        }

        // Form feeds separate pages.
        let text = String::from_utf8_lossy(&output.stdout).replace('\u{c}', "\n\n");
        debug!("Extracted {} characters", text.len());
        Ok(text)
    }
}
