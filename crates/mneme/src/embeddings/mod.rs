// crates/mneme/src/embeddings/mod.rs
// Embedding provider module

pub mod ollama;
pub mod openai;

pub use self::ollama::OllamaEmbeddings;
pub use self::openai::{OpenAiEmbeddingModel, OpenAiEmbeddings};

use anyhow::Result;
use async_trait::async_trait;

/// An embedding provider client
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider identifier, stamped into the vector store
    fn provider_id(&self) -> &'static str;

    /// Model name for display/logging
    fn model_name(&self) -> &str;

    /// Length of every vector this client returns
    fn dimensions(&self) -> usize;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts, preserving order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Check that the provider is reachable and accepts our credentials
    async fn verify(&self) -> Result<()>;
}

/// Pull a human-readable message out of an OpenAI-style error body
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
