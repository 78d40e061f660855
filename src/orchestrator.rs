//! Pipeline orchestrator for docqa.
//!
//! Coordinates ingestion (text derivation, storage, chunking, embedding,
//! indexing) and answers queries against the indexed knowledge base.

use crate::chunking::{create_chunk_records, ChunkRecord, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{DocqaError, Result};
use crate::extract::{PdfConverter, PdftotextConverter};
use crate::rag::{ChatModel, ContextBuilder, OpenAIChatModel, RagEngine, RagResponse};
use crate::storage::{BlobStore, FileKind, FileMeta, NewFile, Page, StoredFile};
use crate::transcription::{Transcriber, WhisperTranscriber};
use crate::vector_store::{IndexEntry, SearchResult, VectorStore};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Swappable backends used by the orchestrator.
pub struct Components {
    pub blobs: Arc<BlobStore>,
    pub vector_store: Arc<VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub pdf_converter: Arc<dyn PdfConverter>,
    pub transcriber: Arc<dyn Transcriber>,
    pub chat: Arc<dyn ChatModel>,
}

/// The main orchestrator for the docqa pipeline.
pub struct Orchestrator {
    settings: Settings,
    blobs: Arc<BlobStore>,
    vector_store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    pdf_converter: Arc<dyn PdfConverter>,
    transcriber: Arc<dyn Transcriber>,
    rag: RagEngine,
    chunking: ChunkingConfig,
    temp_dir: PathBuf,
}

impl Orchestrator {
    /// Create an orchestrator backed by SQLite, the on-disk vector store,
    /// pdftotext and OpenAI.
    pub fn new(settings: Settings) -> Result<Self> {
        let components = Components {
            blobs: Arc::new(BlobStore::new(&settings.sqlite_path())?),
            vector_store: Arc::new(VectorStore::open(&settings.vector_dir())?),
            embedder: Arc::new(OpenAIEmbedder::from_settings(&settings)?),
            pdf_converter: Arc::new(PdftotextConverter::new(&settings.pdf)),
            transcriber: Arc::new(WhisperTranscriber::from_settings(&settings)?),
            chat: Arc::new(OpenAIChatModel::from_settings(&settings.llm)?),
        };

        Self::with_components(settings, components)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(settings: Settings, components: Components) -> Result<Self> {
        let chunking = ChunkingConfig::try_from(&settings.chunking)?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let context_builder = ContextBuilder::new(
            components.vector_store.clone(),
            components.embedder.clone(),
        )
        .with_settings(&settings.retrieval);
        let rag = RagEngine::new(components.chat, context_builder).with_prompts(prompts);

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            settings,
            blobs: components.blobs,
            vector_store: components.vector_store,
            embedder: components.embedder,
            pdf_converter: components.pdf_converter,
            transcriber: components.transcriber,
            rag,
            chunking,
            temp_dir,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<VectorStore> {
        self.vector_store.clone()
    }

    /// Number of chunks currently searchable.
    pub async fn indexed_chunks(&self) -> usize {
        self.vector_store.len().await
    }

    /// Store an upload, derive its text, and index it.
    ///
    /// The relational row is written before indexing and is kept even if
    /// embedding or the vector store write fails.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn ingest(
        &self,
        kind: FileKind,
        file_name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<IngestResult> {
        if !kind.accepts(content_type) {
            return Err(DocqaError::UnsupportedMediaType(format!(
                "{} is not a supported {} type (expected one of: {})",
                content_type,
                kind,
                kind.accepted_content_types().join(", ")
            )));
        }
        if content.is_empty() {
            return Err(DocqaError::InvalidInput("Uploaded file is empty".to_string()));
        }

        let started = Instant::now();
        let file_name = sanitize_file_name(file_name);

        let text = self.derive_text(kind, &file_name, &content).await?;
        info!(
            "Derived {} characters of text from {} in {:.2}s",
            text.len(),
            file_name,
            started.elapsed().as_secs_f64()
        );

        let new_file = NewFile {
            file_name: file_name.clone(),
            content_type: content_type.to_string(),
            content,
            text: Some(text.clone()),
        };
        let blobs = self.blobs.clone();
        let meta = tokio::task::spawn_blocking(move || blobs.insert(kind, &new_file))
            .await
            .map_err(|e| DocqaError::Storage(format!("Blocking task failed: {}", e)))??;

        let chunks = create_chunk_records(&text, &self.chunking);
        let chunks_indexed = match self.index_chunks(meta.id, kind, chunks).await {
            Ok(n) => n,
            Err(e) => {
                error!(file_id = %meta.id, "Stored {} but indexing failed: {}", kind, e);
                return Err(e);
            }
        };

        info!(
            "Ingested {} {} ({} chunks) in {:.2}s",
            kind,
            meta.id,
            chunks_indexed,
            started.elapsed().as_secs_f64()
        );

        Ok(IngestResult {
            id: meta.id,
            kind,
            file_name,
            chunks_indexed,
        })
    }

    /// Ingest a local file, picking the kind from its extension.
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestResult> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let (kind, content_type) = FileKind::from_extension(ext).ok_or_else(|| {
            DocqaError::UnsupportedMediaType(format!("Unsupported file extension: {:?}", ext))
        })?;

        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");

        self.ingest(kind, file_name, content_type, content).await
    }

    /// Write the upload to a temp file and convert or transcribe it.
    async fn derive_text(&self, kind: FileKind, file_name: &str, content: &[u8]) -> Result<String> {
        let suffix = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        let mut temp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&self.temp_dir)?;
        temp.write_all(content)?;
        temp.flush()?;

        // The temp file is removed when `temp` drops, on success or failure.
        match kind {
            FileKind::Document => self.pdf_converter.convert(temp.path()).await,
            FileKind::Video => self.transcriber.transcribe(temp.path()).await,
        }
    }

    /// Generate embeddings and append chunks to the vector store.
    async fn index_chunks(
        &self,
        source_id: Uuid,
        kind: FileKind,
        chunks: Vec<ChunkRecord>,
    ) -> Result<usize> {
        if chunks.is_empty() {
            info!("No chunks to index for {} {}", kind, source_id);
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DocqaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .map(|c| IndexEntry::new(c.id, c.text, source_id, kind))
            .collect();

        self.vector_store.append(entries, embeddings).await
    }

    /// Answer a question from the indexed knowledge base.
    pub async fn query(&self, query: &str) -> Result<RagResponse> {
        self.rag.ask(query).await
    }

    /// Retrieve the chunks a query would be answered from.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.rag.retrieve(query).await
    }

    /// List stored files of a kind. `page` is 1-based.
    pub fn list(&self, kind: FileKind, page: u32, page_size: u32) -> Result<Page<FileMeta>> {
        self.blobs.list(kind, page, page_size)
    }

    /// Fetch a stored file with its bytes.
    pub fn get_file(&self, kind: FileKind, id: Uuid) -> Result<StoredFile> {
        self.blobs
            .get(kind, id)?
            .ok_or_else(|| DocqaError::NotFound(format!("{} {} not found", kind, id)))
    }
}

/// Keep only the final path component of a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(|c| c == '/' || c == '\\')
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// Result of ingesting one file.
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// Id of the stored row.
    pub id: Uuid,
    /// Table the file went into.
    pub kind: FileKind,
    /// Stored file name.
    pub file_name: String,
    /// Number of chunks added to the vector store.
    pub chunks_indexed: usize,
}
