//! In-process fakes for the external services.

use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{DocqaError, Result};
use crate::extract::PdfConverter;
use crate::orchestrator::{Components, Orchestrator};
use crate::rag::ChatModel;
use crate::storage::BlobStore;
use crate::transcription::Transcriber;
use crate::vector_store::VectorStore;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FAKE_DIMENSIONS: usize = 32;

/// Bag-of-words hashing embedder. Identical texts get identical vectors.
#[derive(Default)]
pub struct FakeEmbedder {
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `embed` / `embed_batch` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; FAKE_DIMENSIONS];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % FAKE_DIMENSIONS as u64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        FAKE_DIMENSIONS
    }
}

/// Records every prompt and answers with a fixed HTML paragraph.
#[derive(Default)]
pub struct FakeChat {
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeChat {
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok("<p>fake answer</p>".to_string())
    }
}

/// Treats the uploaded bytes as UTF-8 text.
pub struct FakePdfConverter;

#[async_trait]
impl PdfConverter for FakePdfConverter {
    async fn convert(&self, pdf_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(pdf_path).await?;
        String::from_utf8(bytes).map_err(|e| DocqaError::Extraction(e.to_string()))
    }
}

/// Returns the uploaded bytes as the transcript.
pub struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, video_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(video_path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// An orchestrator wired to the fakes, with small chunk windows and its
/// storage in a temp dir.
pub struct Harness {
    pub orchestrator: Orchestrator,
    pub embedder: Arc<FakeEmbedder>,
    pub chat: Arc<FakeChat>,
    pub dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.general.temp_dir = dir.path().join("tmp").to_string_lossy().into_owned();
    settings.chunking.chunk_size_words = 20;
    settings.chunking.overlap_words = 5;
    settings.chunking.min_chunk_chars = 10;

    let embedder = Arc::new(FakeEmbedder::new());
    let chat = Arc::new(FakeChat::default());
    let components = Components {
        blobs: Arc::new(BlobStore::in_memory().unwrap()),
        vector_store: Arc::new(VectorStore::open(&dir.path().join("vectors")).unwrap()),
        embedder: embedder.clone(),
        pdf_converter: Arc::new(FakePdfConverter),
        transcriber: Arc::new(FakeTranscriber),
        chat: chat.clone(),
    };

    Harness {
        orchestrator: Orchestrator::with_components(settings, components).unwrap(),
        embedder,
        chat,
        dir,
    }
}
