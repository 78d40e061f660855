//! Context building for RAG responses.

use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of chunks handed to the model.
pub const DEFAULT_TOP_K: usize = 6;

/// Builds context from the vector store for a query.
#[derive(Clone)]
pub struct ContextBuilder {
    vector_store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    max_distance: Option<f32>,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(vector_store: Arc<VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            top_k: DEFAULT_TOP_K,
            max_distance: None,
        }
    }

    /// Apply retrieval settings.
    pub fn with_settings(self, settings: &RetrievalSettings) -> Self {
        self.with_top_k(settings.top_k).with_max_distance(settings.max_distance)
    }

    /// Set the number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Drop hits farther than `max_distance` (L2).
    pub fn with_max_distance(mut self, max_distance: Option<f32>) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Retrieve the closest chunks for a query, nearest first.
    #[instrument(skip(self))]
    pub async fn build(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self
            .vector_store
            .search(&query_embedding, self.top_k, self.max_distance)
            .await?;

        debug!("Retrieved {} context chunks", results.len());
        Ok(results)
    }
}

/// Join retrieved chunk texts with blank lines, in rank order.
pub fn format_context_for_prompt(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.entry.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
