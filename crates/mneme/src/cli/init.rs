// crates/mneme/src/cli/init.rs
// `mneme init`: write the project config that selects a memory backend

use anyhow::{Context, Result};
use dialoguer::{Password, Select};
use mneme::BackendKind;
use mneme::config::{EnvConfig, ProjectConfig};
use std::io::IsTerminal;
use std::path::Path;

/// Backend picked when nothing else decides: OpenAI if a key is already
/// available, otherwise local Ollama
fn default_backend(env: &EnvConfig) -> BackendKind {
    if env.api_keys.openai.is_some() {
        BackendKind::RemoteOpenAi
    } else {
        BackendKind::LocalVectorStore
    }
}

fn backend_label(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::RemoteOpenAi => "OpenAI (text-embedding-3-small, needs an API key)",
        BackendKind::LocalVectorStore => "Ollama (local, nomic-embed-text)",
    }
}

/// Apply a platform choice on top of an existing config, keeping everything else
fn apply_choice(existing: Option<ProjectConfig>, kind: BackendKind, api_key: Option<String>) -> ProjectConfig {
    let mut config = existing.unwrap_or_default();
    config.platform = Some(kind.platform_id().to_string());
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    config
}

fn prompt_backend(default: BackendKind) -> Result<BackendKind> {
    let labels: Vec<&str> = BackendKind::ALL.iter().map(|k| backend_label(*k)).collect();
    let default_idx = BackendKind::ALL
        .iter()
        .position(|k| *k == default)
        .unwrap_or(0);

    let sel = Select::new()
        .with_prompt("Memory backend")
        .items(&labels)
        .default(default_idx)
        .interact()?;

    BackendKind::ALL
        .get(sel)
        .copied()
        .context("selection out of range")
}

fn prompt_api_key() -> Result<Option<String>> {
    let key: String = Password::new()
        .with_prompt("OpenAI API key (leave empty to use OPENAI_API_KEY later)")
        .allow_empty_password(true)
        .interact()?;
    let key = key.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

pub fn run_init(
    project_root: &Path,
    env: &EnvConfig,
    platform: Option<String>,
    force: bool,
    yes: bool,
) -> Result<()> {
    let path = ProjectConfig::config_path(project_root);
    let existing = ProjectConfig::load(project_root)?;
    if existing.is_some() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to change the platform.",
            path.display()
        );
    }

    let interactive = !yes && std::io::stdin().is_terminal();

    let kind = match platform {
        Some(id) => BackendKind::from_platform_id(&id).with_context(|| {
            format!(
                "Unsupported platform '{}' (supported: {})",
                id,
                BackendKind::supported_list()
            )
        })?,
        None if interactive => prompt_backend(default_backend(env))?,
        None if yes => default_backend(env),
        None => anyhow::bail!(
            "No terminal to prompt on.\n\
             Use --platform <{}> or --yes to pick a default.",
            BackendKind::ALL.map(|k| k.platform_id()).join("|")
        ),
    };

    let needs_key = kind == BackendKind::RemoteOpenAi
        && env.api_keys.openai.is_none()
        && existing.as_ref().and_then(|c| c.api_key()).is_none();
    let api_key = if needs_key && interactive {
        prompt_api_key()?
    } else {
        None
    };

    let config = apply_choice(existing, kind, api_key);
    let written = config.save(project_root)?;

    println!("Wrote {} (platform = \"{}\")", written.display(), kind.platform_id());
    if needs_key && config.api_key().is_none() {
        println!("Set OPENAI_API_KEY before using memory.");
    }
    println!("Run `mneme status` to check the backend.");
    Ok(())
}
