// crates/mneme/src/store/mod.rs
// Local vector store: SQLite + sqlite-vec behind a deadpool connection pool

mod schema;

use crate::error::StoreError;
use crate::utils::path_to_string;
use deadpool_sqlite::{Config, Hook, HookError, Pool, Runtime};
use mneme_types::{MemoryRecord, RecallHit};
use rusqlite::{Connection, params};
use sqlite_vec::sqlite3_vec_init;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Registers sqlite-vec extension globally (once per process).
/// Must be called before any SQLite connections are opened.
static SQLITE_VEC_INIT: Once = Once::new();

#[allow(clippy::missing_transmute_annotations)]
fn ensure_sqlite_vec_registered() {
    SQLITE_VEC_INIT.call_once(|| {
        // SAFETY: sqlite3_vec_init has the entry-point signature sqlite3_auto_extension
        // expects; the transmute only changes the declared fn-pointer type. The symbol is
        // statically linked, so the pointer stays valid for the life of the process.
        unsafe {
            rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
                sqlite3_vec_init as *const (),
            )));
        }
        tracing::debug!("sqlite-vec extension registered globally");
    });
}

static MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Row as read from SQLite, before tags are decoded
type RawRow = (i64, String, String, String);

/// Embedding-indexed memory store for one provider/dimension pair
pub struct VectorStore {
    pool: Pool,
    path: Option<PathBuf>,
    dimensions: usize,
}

impl VectorStore {
    /// Open (or create) a store file, stamped for `provider` at `dimensions`.
    pub async fn open(path: &Path, provider: &str, dimensions: usize) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open_internal(path_to_string(path), Some(path.to_path_buf()), provider, dimensions)
            .await
    }

    /// Open a private in-memory store (shared across this pool's connections).
    pub async fn open_in_memory(provider: &str, dimensions: usize) -> Result<Self, StoreError> {
        let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let uri = format!(
            "file:mneme_mem_{}_{}?mode=memory&cache=shared",
            std::process::id(),
            n
        );
        Self::open_internal(uri, None, provider, dimensions).await
    }

    async fn open_internal(
        conn_str: String,
        path: Option<PathBuf>,
        provider: &str,
        dimensions: usize,
    ) -> Result<Self, StoreError> {
        ensure_sqlite_vec_registered();

        let pool = Config::new(&conn_str)
            .builder(Runtime::Tokio1)
            .map_err(|e| StoreError::Pool(format!("failed to create pool builder: {e}")))?
            .max_size(4)
            .post_create(connection_setup_hook())
            .build()
            .map_err(|e| StoreError::Pool(format!("failed to build connection pool: {e}")))?;

        let store = Self {
            pool,
            path,
            dimensions,
        };

        let provider = provider.to_string();
        store
            .interact(move |conn| schema::migrate(conn, &provider, dimensions))
            .await?;

        tracing::debug!(
            path = ?store.path,
            dimensions,
            "Opened memory store"
        );
        Ok(store)
    }

    /// File backing this store (`None` for in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Run a closure on a pooled connection, off the async runtime.
    async fn interact<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Connection) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(format!("failed to get connection: {e}")))?;

        conn.interact(move |conn| f(conn))
            .await
            .map_err(|e| StoreError::Pool(format!("interact failed: {e}")))?
    }

    fn check_dims(&self, embedding: &[f32]) -> Result<(), StoreError> {
        if embedding.len() != self.dimensions {
            return Err(StoreError::Dimensions {
                expected: self.dimensions,
                got: embedding.len(),
            });
        }
        Ok(())
    }

    /// Store a memory and its embedding, returning the new id
    pub async fn insert(
        &self,
        content: &str,
        tags: &BTreeMap<String, String>,
        embedding: &[f32],
    ) -> Result<i64, StoreError> {
        self.check_dims(embedding)?;

        let content = content.to_string();
        let tags = serde_json::to_string(tags)
            .map_err(|e| StoreError::Corrupt(format!("unserializable tags: {e}")))?;
        let bytes = embedding_to_bytes(embedding);
        let created_at = chrono::Utc::now().to_rfc3339();

        self.interact(move |conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO memories (content, tags, created_at) VALUES (?1, ?2, ?3)",
                params![content, tags, created_at],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO vec_memory (rowid, embedding) VALUES (?1, ?2)",
                params![id, bytes],
            )?;
            tx.commit()?;
            Ok(id)
        })
        .await
    }

    /// Nearest memories to `embedding` by cosine distance, closest first
    pub async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RecallHit>, StoreError> {
        self.check_dims(embedding)?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let bytes = embedding_to_bytes(embedding);
        let rows: Vec<(RawRow, f32)> = self
            .interact(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT m.id, m.content, m.tags, m.created_at,
                            vec_distance_cosine(v.embedding, ?1) AS distance
                     FROM vec_memory v
                     JOIN memories m ON m.id = v.rowid
                     ORDER BY distance
                     LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![bytes, limit as i64], |row| {
                        Ok((
                            (row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?),
                            row.get::<_, f64>(4)? as f32,
                        ))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for (raw, distance) in rows {
            hits.push(RecallHit {
                record: decode_record(raw)?,
                score: distance_to_score(distance),
            });
        }
        Ok(hits)
    }

    /// Delete a memory; `false` if no such id
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.interact(move |conn| {
            let tx = conn.unchecked_transaction()?;
            let removed = tx.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
            tx.execute("DELETE FROM vec_memory WHERE rowid = ?1", params![id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }

    /// Number of stored memories
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.interact(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
            Ok(n.max(0) as u64)
        })
        .await
    }

    /// Most recently stored memories, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>, StoreError> {
        let rows: Vec<RawRow> = self
            .interact(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, content, tags, created_at FROM memories ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit as i64], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(decode_record).collect()
    }
}

fn decode_record((id, content, tags, created_at): RawRow) -> Result<MemoryRecord, StoreError> {
    let tags = serde_json::from_str(&tags)
        .map_err(|e| StoreError::Corrupt(format!("memory {id} has invalid tags: {e}")))?;
    Ok(MemoryRecord {
        id,
        content,
        tags,
        created_at,
    })
}

/// Little-endian f32 blob, the format sqlite-vec reads
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Map cosine distance (0..=2) to a similarity score (0..=1)
pub fn distance_to_score(distance: f32) -> f32 {
    if distance.is_nan() {
        return 0.0;
    }
    (1.0 - distance).clamp(0.0, 1.0)
}

fn connection_setup_hook() -> Hook {
    Hook::async_fn(|conn, _metrics| {
        Box::pin(async move {
            conn.interact(|conn| setup_connection(conn))
                .await
                .map_err(|e| HookError::Message(format!("interact failed: {e}").into()))?
                .map_err(|e| HookError::Message(format!("connection setup failed: {e}").into()))
        })
    })
}

fn setup_connection(conn: &Connection) -> rusqlite::Result<()> {
    // journal_mode is a no-op for in-memory databases
    conn.execute_batch(
        "PRAGMA journal_mode=WAL; \
         PRAGMA busy_timeout=5000; \
         PRAGMA synchronous=NORMAL;",
    )
}
