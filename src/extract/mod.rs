//! Text extraction from uploaded PDFs.

mod pdftotext;

pub use pdftotext::PdftotextConverter;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Converts a PDF file on disk to plain text.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Extract the text of every page, in reading order.
    async fn convert(&self, pdf_path: &Path) -> Result<String>;
}
