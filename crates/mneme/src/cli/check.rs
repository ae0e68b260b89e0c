// crates/mneme/src/cli/check.rs
// `mneme check`: read-only validation of project config and environment

use anyhow::Result;
use mneme::config::{EnvConfig, ProjectConfig};
use mneme::{BackendChoice, BackendKind, BackendSettings, select};
use std::path::Path;

pub fn run_check(project_root: &Path, env: &EnvConfig) -> Result<()> {
    println!("mneme configuration status\n");

    let config_path = ProjectConfig::config_path(project_root);
    let config = match ProjectConfig::load(project_root) {
        Ok(config) => config,
        Err(e) => {
            println!("  Config file: {} (INVALID)", config_path.display());
            return Err(e.into());
        }
    };

    match &config {
        Some(_) => println!("  Config file: {} (exists)", config_path.display()),
        None => println!("  Config file: {} (not found)", config_path.display()),
    }

    let choice = select(config.as_ref());
    println!("  Platform:    {}", choice);
    println!("  API keys:    {}", env.api_keys.summary());

    if let Some(kind) = choice.backend() {
        let settings = BackendSettings::resolve(kind, project_root, config.as_ref(), env);
        println!("  Store:       {}", settings.store_path.display());
        if kind == BackendKind::LocalVectorStore {
            println!("  Ollama:      {}", settings.ollama_host);
        }
    }

    let validation = env.validate(config.as_ref());
    if validation.warnings.is_empty() && validation.errors.is_empty() {
        println!("\n  Configuration OK");
    } else {
        println!("\n{}", validation.report());
    }

    if !validation.is_valid() {
        anyhow::bail!("configuration has {} error(s)", validation.errors.len());
    }
    if matches!(choice, BackendChoice::Unset) {
        println!("\n  Memory is deferred until a platform is set (`mneme init`).");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_without_config_passes() {
        let dir = TempDir::new().unwrap();
        run_check(dir.path(), &EnvConfig::default()).unwrap();
    }

    #[test]
    fn test_check_unsupported_platform_fails() {
        let dir = TempDir::new().unwrap();
        ProjectConfig {
            platform: Some("Unknown123".into()),
            ..ProjectConfig::default()
        }
        .save(dir.path())
        .unwrap();

        assert!(run_check(dir.path(), &EnvConfig::default()).is_err());
    }
}
