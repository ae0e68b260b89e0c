// crates/mneme/src/memory/settings.rs
// Effective backend settings: project config first, then environment

use crate::config::{EnvConfig, PROJECT_DIR, ProjectConfig};
use crate::embeddings::ollama::DEFAULT_HOST;
use crate::utils::non_blank;
use mneme_types::BackendKind;
use std::path::{Path, PathBuf};

/// Directory (under `.mneme/`) holding the per-backend store files
pub const STORE_DIR: &str = "memory";

/// Everything needed to build one backend, with config and env merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub kind: BackendKind,
    /// Absolute path of the vector store file
    pub store_path: PathBuf,
    /// OpenAI credential (unused by the local backend)
    pub api_key: Option<String>,
    pub embedding_model: Option<String>,
    pub dimensions: Option<usize>,
    /// OpenAI-compatible base URL override
    pub base_url: Option<String>,
    pub ollama_host: String,
    /// Probe the provider before handing out a handle
    pub verify: bool,
}

impl BackendSettings {
    /// Merge the project config (if any) with the environment for `kind`.
    ///
    /// Values in the config file win; the environment fills gaps.
    pub fn resolve(
        kind: BackendKind,
        project_root: &Path,
        config: Option<&ProjectConfig>,
        env: &EnvConfig,
    ) -> Self {
        let memory = config.map(|c| &c.memory);

        let store_path = match memory.and_then(|m| m.store_path.as_deref()) {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => project_root.join(path),
            None => default_store_path(project_root, kind),
        };

        let api_key = config
            .and_then(|c| c.api_key())
            .map(str::to_string)
            .or_else(|| env.api_keys.openai.clone());

        let embedding_model = memory
            .and_then(|m| non_blank(m.embedding_model.as_deref()))
            .map(str::to_string);

        let base_url = memory
            .and_then(|m| non_blank(m.base_url.as_deref()))
            .map(str::to_string)
            .or_else(|| env.embeddings.openai_base_url.clone());

        let ollama_host = memory
            .and_then(|m| non_blank(m.ollama_host.as_deref()))
            .map(str::to_string)
            .or_else(|| env.embeddings.ollama_host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Self {
            kind,
            store_path,
            api_key,
            embedding_model,
            dimensions: memory
                .and_then(|m| m.dimensions)
                .or(env.embeddings.dimensions),
            base_url,
            ollama_host,
            verify: memory.and_then(|m| m.verify).unwrap_or(true),
        }
    }
}

/// `<root>/.mneme/memory/<slug>.db`
pub fn default_store_path(project_root: &Path, kind: BackendKind) -> PathBuf {
    project_root
        .join(PROJECT_DIR)
        .join(STORE_DIR)
        .join(format!("{}.db", kind.slug()))
}
