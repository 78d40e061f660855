//! Relational storage for uploaded files and their derived text.

mod sqlite;

pub use sqlite::BlobStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kind of upload a file is; each kind has its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Video,
}

impl FileKind {
    /// Table holding files of this kind.
    pub(crate) fn table(self) -> &'static str {
        match self {
            FileKind::Document => "documents",
            FileKind::Video => "videos",
        }
    }

    /// Column holding the derived text.
    pub(crate) fn text_column(self) -> &'static str {
        match self {
            FileKind::Document => "md_text",
            FileKind::Video => "transcript",
        }
    }

    /// Content types accepted for uploads of this kind.
    pub fn accepted_content_types(self) -> &'static [&'static str] {
        match self {
            FileKind::Document => &["application/pdf", "application/x-pdf"],
            FileKind::Video => &[
                "video/mp4",
                "video/mpeg",
                "video/quicktime",
                "video/webm",
                "video/x-matroska",
                "video/x-msvideo",
                "video/x-ms-wmv",
                "video/x-flv",
                "video/3gpp",
            ],
        }
    }

    /// Whether an upload's content type is acceptable.
    ///
    /// Parameters such as `; charset=...` are ignored.
    pub fn accepts(self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.accepted_content_types().contains(&essence.as_str())
    }

    /// Guess the kind and content type of a local file from its extension.
    pub fn from_extension(ext: &str) -> Option<(FileKind, &'static str)> {
        let kind = match ext.to_ascii_lowercase().as_str() {
            "pdf" => (FileKind::Document, "application/pdf"),
            "mp4" | "m4v" => (FileKind::Video, "video/mp4"),
            "mpeg" | "mpg" => (FileKind::Video, "video/mpeg"),
            "mov" => (FileKind::Video, "video/quicktime"),
            "webm" => (FileKind::Video, "video/webm"),
            "mkv" => (FileKind::Video, "video/x-matroska"),
            "avi" => (FileKind::Video, "video/x-msvideo"),
            "wmv" => (FileKind::Video, "video/x-ms-wmv"),
            "flv" => (FileKind::Video, "video/x-flv"),
            "3gp" => (FileKind::Video, "video/3gpp"),
            _ => return None,
        };
        Some(kind)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Document => write!(f, "document"),
            FileKind::Video => write!(f, "video"),
        }
    }
}

/// A file to be inserted.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub text: Option<String>,
}

/// A stored file with its bytes.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub meta: FileMeta,
    pub content: Vec<u8>,
    pub text: Option<String>,
}

/// Listing view of a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub file_size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub has_text: bool,
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_content_types() {
        assert!(FileKind::Document.accepts("application/pdf"));
        assert!(FileKind::Document.accepts("application/x-pdf"));
        assert!(FileKind::Document.accepts("Application/PDF; name=a.pdf"));
        assert!(!FileKind::Document.accepts("text/plain"));
        assert!(!FileKind::Document.accepts("video/mp4"));
    }

    #[test]
    fn test_video_content_types() {
        assert!(FileKind::Video.accepts("video/mp4"));
        assert!(FileKind::Video.accepts("video/quicktime"));
        assert!(!FileKind::Video.accepts("audio/mpeg"));
        assert!(!FileKind::Video.accepts("application/pdf"));
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(
            FileKind::from_extension("PDF"),
            Some((FileKind::Document, "application/pdf"))
        );
        assert_eq!(FileKind::from_extension("mkv").map(|k| k.0), Some(FileKind::Video));
        assert_eq!(FileKind::from_extension("docx"), None);
    }
}
