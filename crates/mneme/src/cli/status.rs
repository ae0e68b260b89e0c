// crates/mneme/src/cli/status.rs
// `mneme status`: run the init life-cycle and report where it ended

use anyhow::Result;
use mneme::config::EnvConfig;
use mneme::error::InitError;
use mneme::{Connector, HttpConnector, MemoryStatus, MnemeError, initialize};
use std::path::Path;
use std::sync::Arc;

/// Resolve the memory status for a project.
///
/// Construction failures become `Degraded`; config parse errors propagate.
pub async fn resolve_status(
    project_root: &Path,
    env: &EnvConfig,
    connector: Arc<dyn Connector>,
) -> Result<MemoryStatus> {
    match initialize(project_root, env, connector).await {
        Ok(outcome) => Ok(outcome.status().await?),
        Err(MnemeError::Init(InitError::BackendUnavailable { backend, reason })) => {
            Ok(MemoryStatus::Degraded { backend, reason })
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn run_status(project_root: &Path, env: &EnvConfig, json: bool) -> Result<()> {
    let status = resolve_status(project_root, env, Arc::new(HttpConnector::new())).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if !matches!(status, MemoryStatus::Unsupported { .. }) {
        println!("Project: {}", project_root.display());
        println!("Memory:  {}", status);
    }

    if let MemoryStatus::Unsupported { .. } = status {
        anyhow::bail!("{}", status);
    }
    Ok(())
}
