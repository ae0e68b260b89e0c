// crates/mneme/src/memory/handle.rs
// Live memory backend: embedding client + vector store

use crate::embeddings::Embedder;
use crate::error::{MnemeError, Result};
use crate::store::VectorStore;
use mneme_types::{BackendKind, MemoryRecord, MemoryStatus, RecallHit};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A constructed memory backend, owned by whoever initialized it
pub struct MemoryHandle {
    backend: BackendKind,
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
}

impl MemoryHandle {
    pub(crate) fn new(backend: BackendKind, embedder: Arc<dyn Embedder>, store: VectorStore) -> Self {
        Self {
            backend,
            embedder,
            store,
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Store file backing this handle (`None` for in-memory stores)
    pub fn store_path(&self) -> Option<&Path> {
        self.store.path()
    }

    /// Embed and store one memory, returning its id
    pub async fn remember(&self, content: &str, tags: BTreeMap<String, String>) -> Result<i64> {
        let content = require_text(content, "memory content")?;
        let embedding = self.embed(content).await?;
        let id = self.store.insert(content, &tags, &embedding).await?;
        debug!(id, backend = %self.backend, "Stored memory");
        Ok(id)
    }

    /// Store several memories with one batched embedding call
    pub async fn remember_batch(
        &self,
        items: Vec<(String, BTreeMap<String, String>)>,
    ) -> Result<Vec<i64>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let contents = items
            .iter()
            .map(|(content, _)| require_text(content, "memory content").map(str::to_string))
            .collect::<Result<Vec<_>>>()?;

        let embeddings = self
            .embedder
            .embed_batch(&contents)
            .await
            .map_err(|e| MnemeError::Embedding(format!("{:#}", e)))?;
        if embeddings.len() != contents.len() {
            return Err(MnemeError::Embedding(format!(
                "expected {} embeddings, got {}",
                contents.len(),
                embeddings.len()
            )));
        }

        let mut ids = Vec::with_capacity(contents.len());
        for ((content, (_, tags)), embedding) in contents.iter().zip(&items).zip(&embeddings) {
            ids.push(self.store.insert(content, tags, embedding).await?);
        }
        debug!(count = ids.len(), backend = %self.backend, "Stored memory batch");
        Ok(ids)
    }

    /// Memories most similar to `query`, best first
    pub async fn recall(&self, query: &str, limit: usize) -> Result<Vec<RecallHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = require_text(query, "recall query")?;
        let embedding = self.embed(query).await?;
        Ok(self.store.search(&embedding, limit).await?)
    }

    /// Delete a memory; `false` if the id did not exist
    pub async fn forget(&self, id: i64) -> Result<bool> {
        Ok(self.store.delete(id).await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.store.count().await?)
    }

    /// Latest memories, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        Ok(self.store.recent(limit).await?)
    }

    pub async fn status(&self) -> Result<MemoryStatus> {
        Ok(MemoryStatus::Ready {
            backend: self.backend,
            model: self.model_name().to_string(),
            records: self.count().await?,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(text)
            .await
            .map_err(|e| MnemeError::Embedding(format!("{:#}", e)))
    }
}

impl fmt::Debug for MemoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHandle")
            .field("backend", &self.backend)
            .field("provider", &self.embedder.provider_id())
            .field("model", &self.embedder.model_name())
            .field("store", &self.store.path())
            .finish()
    }
}

fn require_text<'a>(text: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MnemeError::InvalidInput(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}
