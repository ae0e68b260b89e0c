// crates/mneme/src/embeddings/ollama.rs
// Ollama embeddings via OpenAI-compatible /v1/embeddings endpoint

use super::Embedder;
use crate::http::create_local_client;
use crate::utils::truncate_at_boundary;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default Ollama server
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default Ollama embedding model
pub const DEFAULT_MODEL: &str = "nomic-embed-text";

/// Default dimensions for nomic-embed-text
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Output size of common Ollama embedding models
fn known_dimensions(model: &str) -> Option<usize> {
    let base = model.split(':').next().unwrap_or(model);
    match base {
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" | "snowflake-arctic-embed" | "bge-m3" => Some(1024),
        "all-minilm" => Some(384),
        _ => None,
    }
}

/// Max characters to embed per text before truncation.
///
/// Most local embedding models have an 8192-token window; dense text can
/// tokenize at ~2 chars/token, so stay well below 16k chars.
const MAX_TEXT_CHARS: usize = 12_000;

/// Max texts per batch request
const MAX_BATCH_SIZE: usize = 64;

/// Retry attempts
const RETRY_ATTEMPTS: usize = 1;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Ollama embeddings client (no auth required)
pub struct OllamaEmbeddings {
    base_url: String,
    model: String,
    dimensions: usize,
    http_client: reqwest::Client,
}

impl OllamaEmbeddings {
    /// Create a new Ollama embeddings client.
    /// If `http_client` is `None`, creates one with a 60s timeout suitable for
    /// local embedding batches.
    pub fn new(
        base_url: String,
        model: Option<String>,
        dimensions: Option<usize>,
        http_client: Option<reqwest::Client>,
    ) -> Self {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let dimensions = dimensions
            .or_else(|| known_dimensions(&model))
            .unwrap_or(DEFAULT_DIMENSIONS);
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        Self {
            base_url,
            model,
            dimensions,
            http_client: http_client.unwrap_or_else(create_local_client),
        }
    }

    /// Whether `/api/tags` lists our model (with or without a `:tag` suffix)
    fn model_listed(&self, tags: &TagsResponse) -> bool {
        tags.models.iter().any(|m| {
            m.name == self.model
                || m
                    .name
                    .strip_prefix(self.model.as_str())
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }

    /// Core embedding call.
    ///
    /// On a 400 response (typically context overflow), retries with the
    /// truncation limit halved.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let mut max_chars = MAX_TEXT_CHARS;
        let mut last_error = None;

        for attempt in 0..=RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(1000)).await;
            }

            let inputs: Vec<&str> = texts
                .iter()
                .map(|t| {
                    if t.len() > max_chars {
                        debug!(
                            "Truncating text from {} to {} chars for Ollama embedding",
                            t.len(),
                            max_chars
                        );
                        truncate_at_boundary(t, max_chars)
                    } else {
                        t.as_str()
                    }
                })
                .collect();

            let body = serde_json::json!({
                "input": inputs,
                "model": self.model,
            });

            match self.http_client.post(&url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let resp: EmbeddingResponse = response
                            .json()
                            .await
                            .context("Failed to parse Ollama embedding response")?;

                        return self.collect_embeddings(resp, texts.len());
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    if status == reqwest::StatusCode::BAD_REQUEST && attempt < RETRY_ATTEMPTS {
                        max_chars /= 2;
                        debug!(
                            "Ollama returned 400, retrying with truncation limit {} chars",
                            max_chars
                        );
                    }

                    last_error = Some(anyhow::anyhow!(
                        "Ollama embedding request failed ({}): {}",
                        status,
                        body_text.trim()
                    ));
                }
                Err(e) => {
                    last_error = Some(anyhow::anyhow!("Ollama embedding request error: {}", e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Ollama embedding failed")))
    }

    fn collect_embeddings(&self, resp: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
        let mut data = resp.data;
        data.sort_by_key(|d| d.index);

        if data.len() != expected {
            anyhow::bail!("Expected {} embeddings from Ollama, got {}", expected, data.len());
        }

        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            anyhow::bail!(
                "Ollama model '{}' returned {} dimensions, expected {}; set [memory] dimensions = {}",
                self.model,
                bad.len(),
                self.dimensions,
                bad.len()
            );
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbeddings {
    fn provider_id(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_texts(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response from Ollama"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut all_results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            all_results.extend(self.embed_texts(chunk).await?);
        }
        Ok(all_results)
    }

    async fn verify(&self) -> Result<()> {
        let tags: TagsResponse = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .with_context(|| format!("Ollama is not reachable at {}", self.base_url))?
            .error_for_status()
            .context("Ollama rejected /api/tags")?
            .json()
            .await
            .context("Failed to parse Ollama model list")?;

        if !self.model_listed(&tags) {
            anyhow::bail!(
                "Ollama model '{}' is not pulled; run `ollama pull {}`",
                self.model,
                self.model
            );
        }

        debug!(model = %self.model, "Ollama embedding model available");
        Ok(())
    }
}
