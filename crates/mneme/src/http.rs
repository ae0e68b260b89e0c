// crates/mneme/src/http.rs
// Shared HTTP client construction for embedding providers

use std::time::Duration;

/// Connect timeout for all provider requests
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout for remote embedding APIs
pub const FAST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request timeout for local embedding servers (CPU-bound batches are slow)
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Create a client for quick remote API calls (embeddings, credential probes).
pub fn create_fast_client() -> reqwest::Client {
    build_client(FAST_TIMEOUT)
}

/// Create a client for a local embedding server.
pub fn create_local_client() -> reqwest::Client {
    build_client(LOCAL_TIMEOUT)
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
