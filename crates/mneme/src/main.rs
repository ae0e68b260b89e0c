// crates/mneme/src/main.rs
// mneme - persistent project memory for autonomous agents

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use mneme::config::EnvConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_root = cli::project_root(cli.path.clone());

    cli::load_env_files(&project_root, dirs::home_dir().as_deref());

    // Logging goes up before EnvConfig::load so its startup lines are kept
    let level = cli::log_level(cli.verbose, EnvConfig::log_level_from_env().as_deref());
    tracing::subscriber::set_global_default(cli::subscriber(level, std::io::stderr))?;

    let env = EnvConfig::load();

    match cli.command {
        None => cli::run_status(&project_root, &env, false).await?,
        Some(Commands::Status { json }) => cli::run_status(&project_root, &env, json).await?,
        Some(Commands::Remember { text, tags }) => {
            cli::run_remember(&project_root, &env, text, tags).await?
        }
        Some(Commands::Recall { query, limit }) => {
            cli::run_recall(&project_root, &env, query, limit).await?
        }
        Some(Commands::Forget { id }) => cli::run_forget(&project_root, &env, id).await?,
        Some(Commands::Recent { limit }) => cli::run_recent(&project_root, &env, limit).await?,
        Some(Commands::Init {
            platform,
            force,
            yes,
        }) => cli::run_init(&project_root, &env, platform, force, yes)?,
        Some(Commands::Check) => cli::run_check(&project_root, &env)?,
    }

    Ok(())
}
