// crates/mneme/src/error.rs
// Error types for mneme

use mneme_types::{BackendChoice, BackendKind};
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read an existing project configuration file.
///
/// A missing file is never an error; see `ProjectConfig::load`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write config file {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl ConfigError {
    /// Path of the offending config file
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Parse { path, .. } | Self::Unreadable { path, .. } | Self::Write { path, .. } => {
                path
            }
        }
    }
}

/// Failure to construct a memory backend from a resolved choice
#[derive(Error, Debug)]
pub enum InitError {
    /// Caller asked to construct from `Unset` or `Unsupported`
    #[error("cannot construct a memory backend from choice '{0}'")]
    UnsupportedChoice(BackendChoice),

    #[error("{backend} memory backend unavailable: {reason}")]
    BackendUnavailable { backend: BackendKind, reason: String },
}

impl InitError {
    pub fn unavailable(backend: BackendKind, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend,
            reason: reason.into(),
        }
    }
}

/// Vector store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("store was built by {stored_provider} with {stored_dims} dimensions, not {provider} with {dims}")]
    Mismatch {
        stored_provider: String,
        stored_dims: usize,
        provider: String,
        dims: usize,
    },

    #[error("embedding has {got} dimensions, store expects {expected}")]
    Dimensions { expected: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Main error type for the mneme library
#[derive(Error, Debug)]
pub enum MnemeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using MnemeError
pub type Result<T> = std::result::Result<T, MnemeError>;
