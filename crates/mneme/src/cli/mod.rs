// crates/mneme/src/cli/mod.rs
// CLI module for mneme commands

use clap::{Parser, Subcommand};
use mneme::config::PROJECT_DIR;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

pub mod check;
pub mod init;
pub mod memory;
pub mod status;

pub use check::run_check;
pub use init::run_init;
pub use memory::{run_forget, run_recall, run_recent, run_remember};
pub use status::run_status;

#[derive(Parser, Debug)]
#[command(name = "mneme")]
#[command(about = "Persistent project memory for autonomous agents")]
#[command(version)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(short, long, global = true)]
    pub path: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which memory backend this project resolves to (default)
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a memory
    Remember {
        /// Text to remember
        text: String,

        /// Attach a tag (repeatable)
        #[arg(short, long = "tag", value_name = "KEY=VALUE", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },

    /// Find memories similar to a query
    Recall {
        query: String,

        /// Number of results
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },

    /// Delete a memory by id
    Forget { id: i64 },

    /// List the latest memories
    Recent {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Write .mneme/project.toml for this project
    Init {
        /// Platform to select (OpenAI or Ollama)
        #[arg(long)]
        platform: Option<String>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,

        /// Never prompt; pick defaults
        #[arg(short, long)]
        yes: bool,
    },

    /// Validate project config and environment
    Check,
}

fn parse_tag(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty tag key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Resolve the project root from `--path` or the working directory
pub fn project_root(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load `.env` files into the process without overriding what is already
/// set. The project file is read first so it wins over the global one.
pub fn load_env_files(project_root: &Path, home: Option<&Path>) {
    let _ = dotenvy::from_path(project_root.join(PROJECT_DIR).join(".env"));
    if let Some(home) = home {
        let _ = dotenvy::from_path(home.join(PROJECT_DIR).join(".env"));
    }
}

/// Log level from `-v` count, falling back to MNEME_LOG, then WARN
pub fn log_level(verbose: u8, env_level: Option<&str>) -> Level {
    match verbose {
        0 => env_level
            .and_then(|l| l.trim().parse::<Level>().ok())
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Log subscriber for the CLI, plain text without ANSI colors
pub fn subscriber<W>(level: Level, writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(false)
        .finish()
}
