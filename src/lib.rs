//! docqa - Question answering over uploaded PDFs and videos
//!
//! A retrieval-augmented generation backend: files are uploaded, converted to
//! text (PDFs through `pdftotext`, videos through ffmpeg + Whisper), split into
//! overlapping word windows, embedded, and stored in a flat vector index on
//! disk. Questions are answered by an LLM from the closest chunks.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `storage` - SQLite store for raw uploads and derived text
//! - `extract` - PDF to text conversion
//! - `audio` - Audio extraction and splitting with ffmpeg
//! - `transcription` - Speech-to-text for videos
//! - `chunking` - Word-window chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Persistent flat L2 index
//! - `rag` - Retrieval and answer generation
//! - `orchestrator` - Pipeline coordination
//! - `server` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use docqa::config::Settings;
//! use docqa::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator.ingest_path("manual.pdf".as_ref()).await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     let answer = orchestrator.query("How do I reset the device?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod server;
pub mod storage;
pub mod transcription;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{DocqaError, Result};
