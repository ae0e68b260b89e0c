// crates/mneme/src/memory/connector.rs
// Capability seam that builds embedding clients for a backend

use super::settings::BackendSettings;
use crate::embeddings::{Embedder, OllamaEmbeddings, OpenAiEmbeddingModel, OpenAiEmbeddings};
use crate::error::InitError;
use crate::http::{create_fast_client, create_local_client};
use async_trait::async_trait;
use mneme_types::BackendKind;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds (and verifies) the embedding client behind a backend
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        kind: BackendKind,
        settings: &BackendSettings,
    ) -> Result<Arc<dyn Embedder>, InitError>;
}

/// Production connector talking to OpenAI and Ollama over HTTP
pub struct HttpConnector {
    remote: reqwest::Client,
    local: reqwest::Client,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self {
            remote: create_fast_client(),
            local: create_local_client(),
        }
    }

    fn build(
        &self,
        kind: BackendKind,
        settings: &BackendSettings,
    ) -> Result<Arc<dyn Embedder>, InitError> {
        match kind {
            BackendKind::RemoteOpenAi => {
                let api_key = settings.api_key.clone().ok_or_else(|| {
                    InitError::unavailable(
                        kind,
                        "no OpenAI API key (set `api_key` in .mneme/project.toml or OPENAI_API_KEY)",
                    )
                })?;

                let model = match settings.embedding_model.as_deref() {
                    Some(name) => OpenAiEmbeddingModel::from_name(name).ok_or_else(|| {
                        InitError::unavailable(
                            kind,
                            format!("unknown OpenAI embedding model '{}'", name),
                        )
                    })?,
                    None => OpenAiEmbeddingModel::default(),
                };

                let dimensions = settings
                    .dimensions
                    .map(|d| model.check_dimensions(d))
                    .transpose()
                    .map_err(|e| InitError::unavailable(kind, e.to_string()))?;

                Ok(Arc::new(OpenAiEmbeddings::with_http_client(
                    api_key,
                    model,
                    dimensions,
                    settings.base_url.clone(),
                    self.remote.clone(),
                )))
            }
            BackendKind::LocalVectorStore => {
                if settings.dimensions == Some(0) {
                    return Err(InitError::unavailable(
                        kind,
                        "embedding dimensions must be greater than zero",
                    ));
                }

                Ok(Arc::new(OllamaEmbeddings::new(
                    settings.ollama_host.clone(),
                    settings.embedding_model.clone(),
                    settings.dimensions,
                    Some(self.local.clone()),
                )))
            }
        }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(
        &self,
        kind: BackendKind,
        settings: &BackendSettings,
    ) -> Result<Arc<dyn Embedder>, InitError> {
        let embedder = self.build(kind, settings)?;

        if settings.verify {
            embedder
                .verify()
                .await
                .map_err(|e| InitError::unavailable(kind, format!("{:#}", e)))?;
        } else {
            debug!(backend = %kind, "Skipping provider verification");
        }

        info!(
            backend = %kind,
            provider = embedder.provider_id(),
            model = embedder.model_name(),
            dimensions = embedder.dimensions(),
            "Embedding client ready"
        );
        Ok(embedder)
    }
}
