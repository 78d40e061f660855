//! Error types for docqa.

use thiserror::Error;

/// Library-level error type for docqa operations.
#[derive(Error, Debug)]
pub enum DocqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No documents have been indexed yet. Upload a PDF or video first.")]
    IndexEmpty,

    #[error("Requested range not satisfiable for a file of {size} bytes")]
    RangeNotSatisfiable { size: u64 },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl DocqaError {
    /// HTTP status code this error maps to at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            DocqaError::InvalidInput(_) | DocqaError::UnsupportedMediaType(_) => 400,
            DocqaError::NotFound(_) => 404,
            DocqaError::IndexEmpty => 409,
            DocqaError::RangeNotSatisfiable { .. } => 416,
            DocqaError::OpenAI(_) | DocqaError::Http(_) => 502,
            _ => 500,
        }
    }

    /// Whether the failure came from a remote service and may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            DocqaError::OpenAI(_) | DocqaError::Http(_) => true,
            DocqaError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Result type alias for docqa operations.
pub type Result<T> = std::result::Result<T, DocqaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(DocqaError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(DocqaError::UnsupportedMediaType("text/plain".into()).status_code(), 400);
        assert_eq!(DocqaError::NotFound("x".into()).status_code(), 404);
        assert_eq!(DocqaError::IndexEmpty.status_code(), 409);
        assert_eq!(DocqaError::RangeNotSatisfiable { size: 10 }.status_code(), 416);
    }

    #[test]
    fn test_transient_classification() {
        assert!(DocqaError::OpenAI("rate limited".into()).is_transient());
        assert!(!DocqaError::Extraction("bad pdf".into()).is_transient());
        assert!(!DocqaError::IndexEmpty.is_transient());
    }
}
