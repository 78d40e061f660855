//! Word-window chunking of derived text.
//!
//! Text is split on whitespace and re-joined into fixed-size windows that
//! overlap by a fixed number of words. Windows that end up too short are
//! dropped without error.

use crate::config::ChunkingSettings;
use crate::error::{DocqaError, Result};
use uuid::Uuid;

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words repeated at the start of the next chunk.
    pub overlap: usize,
    /// Chunks must have strictly more trimmed characters than this.
    pub min_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            min_chars: 50,
        }
    }
}

impl ChunkingConfig {
    /// Build a validated config.
    pub fn new(chunk_size: usize, overlap: usize, min_chars: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(DocqaError::Config(format!(
                "invalid chunk window: size {} with overlap {}",
                chunk_size, overlap
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            min_chars,
        })
    }

    /// Distance between the starts of consecutive windows.
    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl TryFrom<&ChunkingSettings> for ChunkingConfig {
    type Error = DocqaError;

    fn try_from(s: &ChunkingSettings) -> Result<Self> {
        Self::new(s.chunk_size_words, s.overlap_words, s.min_chunk_chars)
    }
}

/// A chunk paired with the identifier it will be stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub text: String,
}

/// Split text into overlapping word windows.
///
/// Windows start every `chunk_size - overlap` words for as long as the start
/// stays inside the word list, so the last few windows can be shorter than
/// `chunk_size` and repeat words of the window before them.
pub fn split_words(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    (0..words.len())
        .step_by(config.step())
        .map(|start| {
            let end = (start + config.chunk_size).min(words.len());
            words[start..end].join(" ")
        })
        .filter(|chunk| chunk.trim().chars().count() > config.min_chars)
        .collect()
}

/// Chunk text and assign each chunk a fresh identifier.
pub fn create_chunk_records(text: &str, config: &ChunkingConfig) -> Vec<ChunkRecord> {
    split_words(text, config)
        .into_iter()
        .map(|text| ChunkRecord {
            id: Uuid::new_v4(),
            text,
        })
        .collect()
}
