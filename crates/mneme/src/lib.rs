// crates/mneme/src/lib.rs
// mneme - project memory for autonomous agents

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod embeddings;
pub mod error;
pub mod http;
pub mod memory;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{MnemeError, Result};
pub use memory::{
    BackendSettings, Connector, DeferReason, HttpConnector, InitOutcome, MemoryBackendSelector,
    MemoryHandle, initialize, select,
};
pub use mneme_types::{BackendChoice, BackendKind, MemoryRecord, MemoryStatus, RecallHit};
