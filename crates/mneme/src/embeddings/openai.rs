// crates/mneme/src/embeddings/openai.rs
// OpenAI embeddings API client (text-embedding-3-*)

use super::{Embedder, error_message};
use crate::utils::truncate_at_boundary;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API base
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Max input tokens (OpenAI limit for embedding models)
const MAX_INPUT_TOKENS: usize = 8192;

/// Approximate chars per token (conservative estimate)
const CHARS_PER_TOKEN: usize = 4;

/// Max characters to embed (based on token limit)
const MAX_TEXT_CHARS: usize = MAX_INPUT_TOKENS * CHARS_PER_TOKEN;

/// Max texts per batch request (OpenAI allows up to 2048 inputs,
/// but we cap lower to stay well within the 300k total token limit)
const MAX_BATCH_SIZE: usize = 256;

/// Retry attempts
const RETRY_ATTEMPTS: usize = 2;

/// OpenAI embedding models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OpenAiEmbeddingModel {
    /// text-embedding-3-small: 1536 default dims
    #[default]
    TextEmbedding3Small,
    /// text-embedding-3-large: 3072 default dims
    TextEmbedding3Large,
}

impl OpenAiEmbeddingModel {
    /// Get the model name for API calls
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::TextEmbedding3Small => "text-embedding-3-small",
            Self::TextEmbedding3Large => "text-embedding-3-large",
        }
    }

    /// Get default embedding dimensions for this model
    pub fn default_dimensions(&self) -> usize {
        match self {
            Self::TextEmbedding3Small => 1536,
            Self::TextEmbedding3Large => 3072,
        }
    }

    /// Parse from model name string
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "text-embedding-3-small" => Some(Self::TextEmbedding3Small),
            "text-embedding-3-large" => Some(Self::TextEmbedding3Large),
            _ => None,
        }
    }

    /// Check a requested output size (models can shorten, never lengthen)
    pub fn check_dimensions(&self, dims: usize) -> Result<usize> {
        if dims == 0 || dims > self.default_dimensions() {
            anyhow::bail!(
                "{} supports 1..={} dimensions, got {}",
                self.model_name(),
                self.default_dimensions(),
                dims
            );
        }
        Ok(dims)
    }
}

impl std::fmt::Display for OpenAiEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.model_name())
    }
}

/// OpenAI embeddings response types
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// OpenAI embeddings client
pub struct OpenAiEmbeddings {
    api_key: String,
    model: OpenAiEmbeddingModel,
    dimensions: usize,
    base_url: String,
    http_client: reqwest::Client,
}

impl OpenAiEmbeddings {
    /// Create embeddings client with a shared HTTP client
    pub fn with_http_client(
        api_key: String,
        model: OpenAiEmbeddingModel,
        dimensions: Option<usize>,
        base_url: Option<String>,
        http_client: reqwest::Client,
    ) -> Self {
        let dimensions = dimensions.unwrap_or_else(|| model.default_dimensions());
        let base_url = normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));

        Self {
            api_key,
            model,
            dimensions,
            base_url,
            http_client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        if has_version_suffix(&self.base_url) {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/v1/{}", self.base_url, path)
        }
    }

    /// Core embedding call - handles single and batch via the same endpoint
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = texts
            .iter()
            .map(|t| {
                if t.len() > MAX_TEXT_CHARS {
                    debug!("Truncating text from {} to {} chars", t.len(), MAX_TEXT_CHARS);
                    truncate_at_boundary(t, MAX_TEXT_CHARS)
                } else {
                    t.as_str()
                }
            })
            .collect();

        let body = serde_json::json!({
            "input": inputs,
            "model": self.model.model_name(),
            "dimensions": self.dimensions,
            "encoding_format": "float"
        });

        let url = self.endpoint("embeddings");
        let mut last_error = None;
        for attempt in 0..=RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
            }

            match self
                .http_client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let resp: EmbeddingResponse = response
                            .json()
                            .await
                            .context("Failed to parse embedding response")?;
                        return self.collect_embeddings(resp, texts.len());
                    }

                    let error_text = response.text().await.unwrap_or_default();
                    let err = anyhow::anyhow!(
                        "OpenAI API error {}: {}",
                        status,
                        error_message(&error_text)
                    );
                    // Bad requests and auth failures will not improve on retry
                    if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(err);
                    }
                    last_error = Some(err);
                }
                Err(e) => {
                    last_error = Some(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }

    fn collect_embeddings(
        &self,
        resp: EmbeddingResponse,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>> {
        // Sort by index to ensure correct ordering
        let mut data = resp.data;
        data.sort_by_key(|d| d.index);

        if data.len() != expected {
            anyhow::bail!("Expected {} embeddings, got {}", expected, data.len());
        }

        let embeddings: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            anyhow::bail!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions,
                bad.len()
            );
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbeddings {
    fn provider_id(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        self.model.model_name()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_texts(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        if texts.len() <= MAX_BATCH_SIZE {
            return self.embed_texts(texts).await;
        }

        let chunks: Vec<&[String]> = texts.chunks(MAX_BATCH_SIZE).collect();
        debug!(
            "Embedding {} texts in {} parallel batches",
            texts.len(),
            chunks.len()
        );

        let futures: Vec<_> = chunks
            .into_iter()
            .map(|chunk| self.embed_texts(chunk))
            .collect();

        let results = futures::future::join_all(futures).await;

        let mut all_results = Vec::with_capacity(texts.len());
        for result in results {
            all_results.extend(result?);
        }

        Ok(all_results)
    }

    async fn verify(&self) -> Result<()> {
        let response = self
            .http_client
            .get(self.endpoint("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("Cannot reach {}", self.base_url))?;

        let status = response.status();
        if status.is_success() {
            debug!(model = %self.model, "OpenAI credentials accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            anyhow::bail!("OpenAI rejected the API key: {}", error_message(&body));
        }
        anyhow::bail!("OpenAI API error {}: {}", status, error_message(&body))
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Whether the base URL already ends in a version segment like `/v1`
fn has_version_suffix(base_url: &str) -> bool {
    let Some(last_segment) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last_segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: Option<&str>) -> OpenAiEmbeddings {
        OpenAiEmbeddings::with_http_client(
            "sk-test".into(),
            OpenAiEmbeddingModel::default(),
            None,
            base_url.map(str::to_string),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_model_dimensions() {
        let model = OpenAiEmbeddingModel::TextEmbedding3Small;
        assert_eq!(model.default_dimensions(), 1536);
        assert_eq!(model.model_name(), "text-embedding-3-small");
        assert_eq!(OpenAiEmbeddingModel::TextEmbedding3Large.default_dimensions(), 3072);
    }

    #[test]
    fn test_model_from_name() {
        assert_eq!(
            OpenAiEmbeddingModel::from_name("text-embedding-3-large"),
            Some(OpenAiEmbeddingModel::TextEmbedding3Large)
        );
        assert_eq!(OpenAiEmbeddingModel::from_name("ada-002"), None);
    }

    #[test]
    fn test_check_dimensions() {
        let model = OpenAiEmbeddingModel::TextEmbedding3Small;
        assert_eq!(model.check_dimensions(512).unwrap(), 512);
        assert!(model.check_dimensions(0).is_err());
        assert!(model.check_dimensions(3072).is_err());
    }

    #[test]
    fn test_max_text_chars() {
        assert_eq!(MAX_TEXT_CHARS, 32768);
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            client(None).endpoint("embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            client(Some("http://localhost:8080/v1/")).endpoint("models"),
            "http://localhost:8080/v1/models"
        );
        assert_eq!(
            client(Some("https://proxy.example.com/openai")).endpoint("embeddings"),
            "https://proxy.example.com/openai/v1/embeddings"
        );
    }

    #[test]
    fn test_custom_dimensions() {
        let c = OpenAiEmbeddings::with_http_client(
            "sk-test".into(),
            OpenAiEmbeddingModel::TextEmbedding3Large,
            Some(256),
            None,
            reqwest::Client::new(),
        );
        assert_eq!(c.dimensions(), 256);
        assert_eq!(c.model_name(), "text-embedding-3-large");
        assert_eq!(c.provider_id(), "openai");
    }

    #[test]
    fn test_collect_embeddings_sorts_and_validates() {
        let c = OpenAiEmbeddings::with_http_client(
            "sk-test".into(),
            OpenAiEmbeddingModel::default(),
            Some(2),
            None,
            reqwest::Client::new(),
        );
        let resp: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [
                {"embedding": [0.3, 0.4], "index": 1},
                {"embedding": [0.1, 0.2], "index": 0}
            ]}"#,
        )
        .unwrap();
        let out = c.collect_embeddings(resp, 2).unwrap();
        assert_eq!(out, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        let short: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [0.1], "index": 0}]}"#).unwrap();
        assert!(c.collect_embeddings(short, 1).is_err());
    }
}
