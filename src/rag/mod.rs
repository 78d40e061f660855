//! RAG (Retrieval-Augmented Generation) for question answering.
//!
//! A query is embedded, the nearest chunks are pulled from the vector store,
//! and the chat model answers from that context only.

pub mod context;
mod llm;
mod response;

pub use context::{format_context_for_prompt, ContextBuilder};
pub use llm::{ChatModel, OpenAIChatModel};
pub use response::{RagEngine, RagResponse};
