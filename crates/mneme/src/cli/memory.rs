// crates/mneme/src/cli/memory.rs
// Memory commands: remember, recall, forget, recent

use anyhow::Result;
use mneme::config::EnvConfig;
use mneme::{BackendKind, HttpConnector, InitOutcome, MemoryHandle, initialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Initialize memory for a command.
///
/// `None` when memory is deferred (a hint is printed and the command is a
/// no-op). Unsupported platforms and construction failures are errors.
async fn open_memory(project_root: &Path, env: &EnvConfig) -> Result<Option<MemoryHandle>> {
    let outcome = initialize(project_root, env, Arc::new(HttpConnector::new())).await?;
    handle_or_hint(outcome)
}

fn handle_or_hint(outcome: InitOutcome) -> Result<Option<MemoryHandle>> {
    match outcome {
        InitOutcome::Ready(handle) => Ok(Some(handle)),
        InitOutcome::Deferred(reason) => {
            println!("Memory is not enabled for this project: {}", reason);
            Ok(None)
        }
        InitOutcome::Unsupported(identifier) => anyhow::bail!(
            "Unsupported platform '{}' in .mneme/project.toml (supported: {})",
            identifier,
            BackendKind::supported_list()
        ),
    }
}

pub async fn run_remember(
    project_root: &Path,
    env: &EnvConfig,
    text: String,
    tags: Vec<(String, String)>,
) -> Result<()> {
    let Some(memory) = open_memory(project_root, env).await? else {
        return Ok(());
    };

    let tags: BTreeMap<String, String> = tags.into_iter().collect();
    let id = memory.remember(&text, tags).await?;
    println!("Remembered #{} ({} backend)", id, memory.backend());
    Ok(())
}

pub async fn run_recall(project_root: &Path, env: &EnvConfig, query: String, limit: usize) -> Result<()> {
    let Some(memory) = open_memory(project_root, env).await? else {
        return Ok(());
    };

    let hits = memory.recall(&query, limit).await?;
    if hits.is_empty() {
        println!("No memories found.");
        return Ok(());
    }

    for hit in hits {
        println!(
            "[{:.3}] #{} {}{}",
            hit.score,
            hit.record.id,
            hit.record.content,
            format_tags(&hit.record.tags)
        );
    }
    Ok(())
}

pub async fn run_forget(project_root: &Path, env: &EnvConfig, id: i64) -> Result<()> {
    let Some(memory) = open_memory(project_root, env).await? else {
        return Ok(());
    };

    if memory.forget(id).await? {
        println!("Forgot #{}", id);
        Ok(())
    } else {
        anyhow::bail!("No memory with id {}", id)
    }
}

pub async fn run_recent(project_root: &Path, env: &EnvConfig, limit: usize) -> Result<()> {
    let Some(memory) = open_memory(project_root, env).await? else {
        return Ok(());
    };

    let records = memory.recent(limit).await?;
    if records.is_empty() {
        println!("No memories yet.");
    }
    for record in records {
        println!(
            "#{} {} {}{}",
            record.id,
            record.created_at,
            record.content,
            format_tags(&record.tags)
        );
    }
    Ok(())
}

fn format_tags(tags: &BTreeMap<String, String>) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let joined = tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("  [{}]", joined)
}
