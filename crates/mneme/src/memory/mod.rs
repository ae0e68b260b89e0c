// crates/mneme/src/memory/mod.rs
// Memory backend selection, construction and use

mod connector;
mod handle;
mod lifecycle;
mod selector;
mod settings;

pub use connector::{Connector, HttpConnector};
pub use handle::MemoryHandle;
pub use lifecycle::{DeferReason, InitOutcome, initialize};
pub use selector::{MemoryBackendSelector, select};
pub use settings::{BackendSettings, STORE_DIR, default_store_path};
