//! Configuration settings for docqa.

use crate::error::{DocqaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub vector_store: VectorStoreSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub transcription: TranscriptionSettings,
    pub pdf: PdfSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary upload and audio files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.docqa".to_string(),
            temp_dir: "/tmp/docqa".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload body, in megabytes.
    pub max_upload_mb: usize,
    /// Default page size for listings.
    pub page_size: u32,
    /// Upper bound for a client-requested page size.
    pub max_page_size: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_mb: 512,
            page_size: 20,
            max_page_size: 100,
        }
    }
}

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database holding uploaded files.
    pub sqlite_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.docqa/knowledge_base.db".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Directory holding the index and lookup-table files.
    pub dir: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            dir: "~/.docqa/vector_store".to_string(),
        }
    }
}

/// Word-window chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Words per chunk.
    pub chunk_size_words: usize,
    /// Words shared between consecutive chunks.
    pub overlap_words: usize,
    /// Chunks with this many trimmed characters or fewer are dropped.
    pub min_chunk_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size_words: 500,
            overlap_words: 50,
            min_chunk_chars: 50,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of nearest chunks to include as context.
    pub top_k: usize,
    /// Drop results farther than this L2 distance. Disabled when unset.
    pub max_distance: Option<f32>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            max_distance: None,
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat completion model.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout for all OpenAI calls.
    pub timeout_seconds: u64,
    /// Alternate OpenAI-compatible endpoint.
    pub api_base: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
            api_base: None,
        }
    }
}

/// Video transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Largest audio piece sent in one transcription request.
    pub max_chunk_bytes: u64,
    /// Pieces transcribed at once. 1 keeps the pipeline sequential.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            max_chunk_bytes: 20 * 1024 * 1024,
            max_concurrent_chunks: 1,
        }
    }
}

/// PDF conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// Converter executable (poppler's pdftotext or a compatible tool).
    pub command: String,
    /// Keep the physical page layout.
    pub layout: bool,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            command: "pdftotext".to_string(),
            layout: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.chunk_size_words == 0 {
            return Err(DocqaError::Config("chunking.chunk_size_words must be > 0".into()));
        }
        if c.overlap_words >= c.chunk_size_words {
            return Err(DocqaError::Config(format!(
                "chunking.overlap_words ({}) must be smaller than chunk_size_words ({})",
                c.overlap_words, c.chunk_size_words
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(DocqaError::Config("retrieval.top_k must be > 0".into()));
        }
        if self.transcription.max_chunk_bytes == 0 {
            return Err(DocqaError::Config("transcription.max_chunk_bytes must be > 0".into()));
        }
        if let Some(base) = self.llm.api_base.as_deref().filter(|b| !b.is_empty()) {
            url::Url::parse(base)
                .map_err(|e| DocqaError::Config(format!("llm.api_base is not a valid URL: {}", e)))?;
        }
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| DocqaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.database.sqlite_path)
    }

    /// Get the expanded vector store directory.
    pub fn vector_dir(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.dir)
    }
}
