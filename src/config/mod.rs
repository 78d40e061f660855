//! Configuration module for docqa.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, DatabaseSettings, EmbeddingSettings, GeneralSettings, LlmSettings,
    PdfSettings, PromptSettings, RetrievalSettings, ServerSettings, Settings,
    TranscriptionSettings, VectorStoreSettings,
};
