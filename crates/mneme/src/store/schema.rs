// crates/mneme/src/store/schema.rs
// Vector store schema and provider stamp

use crate::error::StoreError;
use rusqlite::{Connection, OptionalExtension, params};

const META_PROVIDER: &str = "embedding_provider";
const META_DIMENSIONS: &str = "embedding_dimensions";

const BASE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS memories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    content     TEXT NOT NULL,
    tags        TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS store_meta (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);
";

/// Create tables on a fresh store and check the provider stamp on an old one.
///
/// The first open records which provider and dimensionality built the store.
/// Vectors from different models are not comparable, so a later open with a
/// different provider or size is refused.
pub(crate) fn migrate(conn: &Connection, provider: &str, dims: usize) -> Result<(), StoreError> {
    conn.execute_batch(BASE_SCHEMA)?;

    match read_stamp(conn)? {
        Some((stored_provider, stored_dims)) => {
            if stored_provider != provider || stored_dims != dims {
                return Err(StoreError::Mismatch {
                    stored_provider,
                    stored_dims,
                    provider: provider.to_string(),
                    dims,
                });
            }
        }
        None => {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                params![META_PROVIDER, provider],
            )?;
            tx.execute(
                "INSERT INTO store_meta (key, value) VALUES (?1, ?2)",
                params![META_DIMENSIONS, dims.to_string()],
            )?;
            tx.commit()?;
            tracing::info!(provider, dims, "Stamped new memory store");
        }
    }

    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vec_memory USING vec0(embedding float[{dims}])"
    ))?;
    Ok(())
}

fn read_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM store_meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

/// Provider and dimensions recorded in the store, if stamped
pub(crate) fn read_stamp(conn: &Connection) -> Result<Option<(String, usize)>, StoreError> {
    let provider = read_meta(conn, META_PROVIDER)?;
    let dims = read_meta(conn, META_DIMENSIONS)?;

    match (provider, dims) {
        (Some(provider), Some(dims)) => {
            let dims = dims
                .parse()
                .map_err(|_| StoreError::Corrupt(format!("bad dimension stamp '{}'", dims)))?;
            Ok(Some((provider, dims)))
        }
        (None, None) => Ok(None),
        _ => Err(StoreError::Corrupt("incomplete provider stamp".into())),
    }
}
