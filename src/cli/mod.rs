//! CLI module for docqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// docqa - Question answering over your PDFs and videos
///
/// Ingests documents and videos, indexes their text, and answers questions
/// from the indexed content over HTTP or the command line.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration and create data directories
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host from the config)
        #[arg(long, env = "DOCQA_HOST")]
        host: Option<String>,

        /// Port to bind to (defaults to server.port from the config)
        #[arg(short, long, env = "DOCQA_PORT")]
        port: Option<u16>,
    },

    /// Ingest a local PDF or video file
    Ingest {
        /// Path to the file; the kind is taken from the extension
        path: String,
    },

    /// Ask a question and get an answer from the knowledge base
    Ask {
        /// The question to ask
        query: String,

        /// Number of context chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List stored documents or videos
    List {
        /// List videos instead of documents
        #[arg(long)]
        videos: bool,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Items per page
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
