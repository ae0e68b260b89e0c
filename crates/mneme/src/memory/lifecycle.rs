// crates/mneme/src/memory/lifecycle.rs
// Memory initialization: load -> select -> construct

use super::connector::Connector;
use super::handle::MemoryHandle;
use super::selector::{MemoryBackendSelector, select};
use crate::config::{EnvConfig, ProjectConfig};
use crate::error::Result;
use mneme_types::{BackendChoice, MemoryStatus};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why memory was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
    /// No `.mneme/project.toml` yet
    NoConfig,
    /// Config exists but `platform` is missing or blank
    PlatformUnset,
    /// MNEME_DISABLE_MEMORY
    Disabled,
}

impl fmt::Display for DeferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConfig => write!(f, "no project config; run `mneme init` to enable memory"),
            Self::PlatformUnset => write!(f, "no platform configured in .mneme/project.toml"),
            Self::Disabled => write!(f, "memory disabled by MNEME_DISABLE_MEMORY"),
        }
    }
}

/// Terminal state of one initialization attempt
#[derive(Debug)]
pub enum InitOutcome {
    Ready(MemoryHandle),
    /// Proceed without persistent memory
    Deferred(DeferReason),
    /// The config names a platform we cannot back memory with
    Unsupported(String),
}

impl InitOutcome {
    pub fn into_handle(self) -> Option<MemoryHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub async fn status(&self) -> Result<MemoryStatus> {
        match self {
            Self::Ready(handle) => handle.status().await,
            Self::Deferred(reason) => Ok(MemoryStatus::Deferred {
                reason: reason.to_string(),
            }),
            Self::Unsupported(identifier) => Ok(MemoryStatus::Unsupported {
                identifier: identifier.clone(),
            }),
        }
    }
}

/// Run the whole life-cycle for a project.
///
/// Absence resolves to `Deferred`. A malformed config file and a backend
/// that cannot be built come back as errors; the caller decides whether to
/// abort or carry on without memory.
pub async fn initialize(
    project_root: &Path,
    env: &EnvConfig,
    connector: Arc<dyn Connector>,
) -> Result<InitOutcome> {
    if env.disable_memory {
        info!("Memory initialization skipped (MNEME_DISABLE_MEMORY)");
        return Ok(InitOutcome::Deferred(DeferReason::Disabled));
    }

    let config = ProjectConfig::load(project_root)?;
    debug!(present = config.is_some(), "Config known");

    let choice = select(config.as_ref());
    debug!(choice = %choice, "Choice known");

    match &choice {
        BackendChoice::Unset => {
            let reason = if config.is_some() {
                DeferReason::PlatformUnset
            } else {
                DeferReason::NoConfig
            };
            info!(reason = %reason, "Memory deferred");
            Ok(InitOutcome::Deferred(reason))
        }
        BackendChoice::Unsupported(identifier) => {
            warn!(platform = %identifier, "Unsupported memory platform");
            Ok(InitOutcome::Unsupported(identifier.clone()))
        }
        BackendChoice::LocalVectorStore | BackendChoice::RemoteOpenAi => {
            let selector = MemoryBackendSelector::new(project_root, env.clone(), connector);
            let handle = selector.construct(&choice, config.as_ref()).await?;
            Ok(InitOutcome::Ready(handle))
        }
    }
}
