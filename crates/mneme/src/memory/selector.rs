// crates/mneme/src/memory/selector.rs
// Backend selection from project config, and backend construction

use super::connector::Connector;
use super::handle::MemoryHandle;
use super::settings::BackendSettings;
use crate::config::{EnvConfig, ProjectConfig, Setting};
use crate::error::{InitError, StoreError};
use crate::store::VectorStore;
use mneme_types::{BackendChoice, BackendKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Decide which backend a config snapshot asks for.
///
/// Pure and total: absent config, a missing `platform` key and a blank one
/// all resolve to [`BackendChoice::Unset`]; an unrecognized value comes back
/// verbatim in [`BackendChoice::Unsupported`].
pub fn select(config: Option<&ProjectConfig>) -> BackendChoice {
    let Some(config) = config else {
        debug!("No project config, memory backend unset");
        return BackendChoice::Unset;
    };

    match config.platform() {
        Setting::Missing => {
            debug!("Project config has no platform key, memory backend unset");
            BackendChoice::Unset
        }
        Setting::Blank => {
            debug!("Project config platform is blank, memory backend unset");
            BackendChoice::Unset
        }
        Setting::Value(id) => match BackendKind::from_platform_id(id) {
            Some(kind) => BackendChoice::from(kind),
            None => BackendChoice::Unsupported(id.to_string()),
        },
    }
}

/// Builds memory handles for a project
pub struct MemoryBackendSelector {
    project_root: PathBuf,
    env: EnvConfig,
    connector: Arc<dyn Connector>,
}

impl MemoryBackendSelector {
    pub fn new(project_root: impl Into<PathBuf>, env: EnvConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            project_root: project_root.into(),
            env,
            connector,
        }
    }

    /// Settings `construct` would use for `kind`
    pub fn settings(&self, kind: BackendKind, config: Option<&ProjectConfig>) -> BackendSettings {
        BackendSettings::resolve(kind, &self.project_root, config, &self.env)
    }

    /// Instantiate the backend for `choice`.
    ///
    /// `Unset` and `Unsupported` are refused before anything is touched.
    pub async fn construct(
        &self,
        choice: &BackendChoice,
        config: Option<&ProjectConfig>,
    ) -> Result<MemoryHandle, InitError> {
        let Some(kind) = choice.backend() else {
            return Err(InitError::UnsupportedChoice(choice.clone()));
        };

        let settings = self.settings(kind, config);
        debug!(
            backend = %kind,
            store = %settings.store_path.display(),
            "Constructing memory backend"
        );

        let embedder = self.connector.connect(kind, &settings).await?;

        let store = VectorStore::open(
            &settings.store_path,
            embedder.provider_id(),
            embedder.dimensions(),
        )
        .await
        .map_err(|e| store_unavailable(kind, &settings.store_path, e))?;

        info!(
            backend = %kind,
            model = embedder.model_name(),
            store = %settings.store_path.display(),
            "Memory backend ready"
        );
        Ok(MemoryHandle::new(kind, embedder, store))
    }
}

fn store_unavailable(kind: BackendKind, path: &Path, err: StoreError) -> InitError {
    let reason = match err {
        StoreError::Mismatch { .. } => format!(
            "{} (move or delete {} to rebuild it)",
            err,
            path.display()
        ),
        other => format!("cannot open store {}: {}", path.display(), other),
    };
    InitError::unavailable(kind, reason)
}
