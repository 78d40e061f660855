//! RAG response generation.

use super::{format_context_for_prompt, ChatModel, ContextBuilder};
use crate::config::Prompts;
use crate::error::{DocqaError, Result};
use crate::vector_store::SearchResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// RAG engine for question answering.
#[derive(Clone)]
pub struct RagEngine {
    chat: Arc<dyn ChatModel>,
    context_builder: ContextBuilder,
    prompts: Prompts,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(chat: Arc<dyn ChatModel>, context_builder: ContextBuilder) -> Self {
        Self {
            chat,
            context_builder,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Retrieve context only, without calling the model.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = validate_query(query)?;
        self.context_builder.build(query).await
    }

    /// Answer a question from the knowledge base.
    #[instrument(skip(self))]
    pub async fn ask(&self, query: &str) -> Result<RagResponse> {
        let query = validate_query(query)?;
        let started = Instant::now();

        let sources = self.context_builder.build(query).await?;
        let context = format_context_for_prompt(&sources);

        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("context".to_string(), context);

        let system = self.prompts.render_with_custom(&self.prompts.rag.system, &HashMap::new());
        let user = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        let answer = self.chat.complete(&system, &user).await?;

        info!(
            "Answered query from {} chunks in {:.2}s",
            sources.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(RagResponse { answer, sources })
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(DocqaError::InvalidInput("Query cannot be empty".to_string()));
    }
    Ok(trimmed)
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer (HTML).
    pub answer: String,
    /// Chunks the answer was built from, nearest first.
    pub sources: Vec<SearchResult>,
}
