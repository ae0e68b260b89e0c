// crates/mneme/src/config/mod.rs
// Project and environment configuration

pub mod env;
pub mod file;

pub use env::{ApiKeys, ConfigValidation, EmbeddingsConfig, EnvConfig};
pub use file::{CONFIG_FILE, MemorySection, PROJECT_DIR, ProjectConfig, Setting};
