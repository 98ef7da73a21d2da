//! SQLite implementation of the durable cache store.
//!
//! Connections are pooled (bounded by a semaphore) and every statement runs
//! on the blocking thread pool, since `rusqlite::Connection` is synchronous.
//! Tags are stored as a JSON array and matched with `json_each`.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::models::{CacheEntry, EntryMetadata, StoreSummary};
use super::store::{DurableStore, EntryFilter, StoreConnector};
use crate::error::{Result, StatsError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

const MEMORY_PATH: &str = ":memory:";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache_entries (
        key TEXT PRIMARY KEY,
        payload BLOB NOT NULL,
        is_compressed INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL,
        access_count INTEGER NOT NULL DEFAULT 0,
        last_accessed_at INTEGER NOT NULL,
        size_bytes INTEGER NOT NULL,
        tags TEXT NOT NULL DEFAULT '[]',
        subject_id TEXT,
        kind TEXT NOT NULL,
        version INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cache_expires ON cache_entries(expires_at);
    CREATE INDEX IF NOT EXISTS idx_cache_subject ON cache_entries(subject_id);
";

const SELECT_COLUMNS: &str = "key, payload, is_compressed, created_at, expires_at, access_count, \
     last_accessed_at, size_bytes, tags, subject_id, kind, version";

/// Connects to (and creates if needed) a SQLite cache database.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: String,
    pool_size: usize,
}

impl SqliteConnector {
    /// `pool_size` is forced to 1 for `:memory:`, where every connection
    /// would otherwise see its own empty database.
    pub fn new(path: impl Into<String>, pool_size: usize) -> Self {
        let path = path.into();
        let pool_size = if path == MEMORY_PATH {
            1
        } else {
            pool_size.max(1)
        };
        Self { path, pool_size }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH, 1)
    }
}

#[async_trait]
impl StoreConnector for SqliteConnector {
    fn describe(&self) -> String {
        format!("sqlite://{}", self.path)
    }

    async fn connect(&self) -> Result<Arc<dyn DurableStore>> {
        let store = SqliteStore::open(&self.path, self.pool_size).await?;
        Ok(Arc::new(store))
    }
}

/// Durable store backed by a SQLite database file.
pub struct SqliteStore {
    path: String,
    idle: Mutex<Vec<Connection>>,
    permits: Semaphore,
}

impl SqliteStore {
    /// Open the database, create the schema and seed the pool with one
    /// verified connection.
    pub async fn open(path: &str, pool_size: usize) -> Result<Self> {
        let owned_path = path.to_string();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            if owned_path != MEMORY_PATH {
                if let Some(parent) = Path::new(&owned_path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
            }
            let conn = open_connection(&owned_path)?;
            conn.execute_batch(SCHEMA)
                .map_err(|e| StatsError::CacheUnavailable(format!("Failed to create schema: {}", e)))?;
            Ok(conn)
        })
        .await
        .map_err(|e| StatsError::Internal(format!("SQLite open task failed: {}", e)))??;

        info!("Opened SQLite cache store at {} (pool size {})", path, pool_size);

        Ok(Self {
            path: path.to_string(),
            idle: Mutex::new(vec![conn]),
            permits: Semaphore::new(pool_size.max(1)),
        })
    }

    /// Run `f` on a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| StatsError::CacheUnavailable("connection pool closed".to_string()))?;

        let pooled = self.idle.lock().pop();
        let path = self.path.clone();

        let (conn, result) = tokio::task::spawn_blocking(move || -> Result<_> {
            let conn = match pooled {
                Some(conn) => conn,
                None => open_connection(&path)?,
            };
            let result = f(&conn);
            Ok((conn, result))
        })
        .await
        .map_err(|e| StatsError::Internal(format!("SQLite {} task failed: {}", operation, e)))??;

        self.idle.lock().push(conn);
        result.map_err(|e| StatsError::CacheUnavailable(format!("SQLite {} failed: {}", operation, e)))
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let key = key.to_string();
        self.with_conn("get", move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM cache_entries WHERE key = ?1", SELECT_COLUMNS),
                [&key],
                row_to_entry,
            )
            .optional()
        })
        .await
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let tags = serde_json::to_string(&entry.tags)?;
        self.with_conn("put", move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (key, payload, is_compressed, created_at, expires_at, access_count,
                  last_accessed_at, size_bytes, tags, subject_id, kind, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    entry.key,
                    entry.payload,
                    entry.is_compressed,
                    entry.created_at.timestamp_millis(),
                    entry.expires_at.timestamp_millis(),
                    entry.access_count as i64,
                    entry.last_accessed_at.timestamp_millis(),
                    entry.size_bytes as i64,
                    tags,
                    entry.metadata.subject_id,
                    entry.metadata.kind,
                    entry.metadata.version,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn touch(&self, key: &str, at: DateTime<Utc>) -> Result<()> {
        let key = key.to_string();
        self.with_conn("touch", move |conn| {
            conn.execute(
                "UPDATE cache_entries
                 SET access_count = access_count + 1, last_accessed_at = ?2
                 WHERE key = ?1",
                params![key, at.timestamp_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_many(&self, filter: EntryFilter) -> Result<Vec<String>> {
        let removed = self
            .with_conn("delete_many", move |conn| {
                let keys = matching_keys(conn, &filter)?;
                delete_keys(conn, &keys)?;
                Ok(keys)
            })
            .await?;

        if !removed.is_empty() {
            debug!("Deleted {} durable cache entries", removed.len());
        }
        Ok(removed)
    }

    async fn count(&self, filter: EntryFilter) -> Result<u64> {
        self.with_conn("count", move |conn| match &filter {
            EntryFilter::Pattern(_) => Ok(matching_keys(conn, &filter)?.len() as u64),
            _ => {
                let (clause, param) = filter_clause(&filter);
                let sql = format!("SELECT COUNT(*) FROM cache_entries WHERE {}", clause);
                let count: i64 = match param {
                    Some(param) => conn.query_row(&sql, [param], |row| row.get(0))?,
                    None => conn.query_row(&sql, [], |row| row.get(0))?,
                };
                Ok(count as u64)
            }
        })
        .await
    }

    async fn summary(&self) -> Result<StoreSummary> {
        self.with_conn("summary", |conn| {
            conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(is_compressed), 0),
                        COALESCE(SUM(LENGTH(payload)), 0),
                        COALESCE(SUM(size_bytes), 0),
                        AVG(CASE WHEN is_compressed = 1 AND size_bytes > 0
                                 THEN CAST(LENGTH(payload) AS REAL) / size_bytes END)
                 FROM cache_entries",
                [],
                |row| {
                    Ok(StoreSummary {
                        entries: row.get::<_, i64>(0)? as u64,
                        compressed_entries: row.get::<_, i64>(1)? as u64,
                        stored_bytes: row.get::<_, i64>(2)? as u64,
                        original_bytes: row.get::<_, i64>(3)? as u64,
                        average_compression_ratio: row.get::<_, Option<f64>>(4)?.unwrap_or(1.0),
                    })
                },
            )
        })
        .await
    }
}

fn open_connection(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| StatsError::CacheUnavailable(format!("Failed to open {}: {}", path, e)))?;

    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| StatsError::CacheUnavailable(format!("Failed to configure {}: {}", path, e)))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| StatsError::CacheUnavailable(format!("Failed to configure WAL: {}", e)))?;

    Ok(conn)
}

/// SQL condition (and its single parameter) for non-regex filters.
fn filter_clause(filter: &EntryFilter) -> (&'static str, Option<rusqlite::types::Value>) {
    use rusqlite::types::Value;
    match filter {
        EntryFilter::All | EntryFilter::Pattern(_) => ("1 = 1", None),
        EntryFilter::Key(key) => ("key = ?1", Some(Value::Text(key.clone()))),
        EntryFilter::Tag(tag) => (
            "EXISTS (SELECT 1 FROM json_each(cache_entries.tags) WHERE json_each.value = ?1)",
            Some(Value::Text(tag.clone())),
        ),
        EntryFilter::ExpiredAt(at) => ("expires_at <= ?1", Some(Value::Integer(at.timestamp_millis()))),
    }
}

fn matching_keys(conn: &Connection, filter: &EntryFilter) -> rusqlite::Result<Vec<String>> {
    let (clause, param) = filter_clause(filter);
    let mut stmt = conn.prepare(&format!(
        "SELECT key FROM cache_entries WHERE {} ORDER BY key",
        clause
    ))?;

    let keys = match param {
        Some(param) => stmt
            .query_map([param], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };

    Ok(match filter {
        EntryFilter::Pattern(pattern) => keys.into_iter().filter(|k| pattern.is_match(k)).collect(),
        _ => keys,
    })
}

fn delete_keys(conn: &Connection, keys: &[String]) -> rusqlite::Result<()> {
    if keys.is_empty() {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("DELETE FROM cache_entries WHERE key = ?1")?;
        for key in keys {
            stmt.execute([key])?;
        }
    }
    tx.commit()
}

fn timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<CacheEntry> {
    let tags_json: String = row.get(8)?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(CacheEntry {
        key: row.get(0)?,
        payload: row.get(1)?,
        is_compressed: row.get(2)?,
        created_at: timestamp(row.get(3)?),
        expires_at: timestamp(row.get(4)?),
        access_count: row.get::<_, i64>(5)? as u64,
        last_accessed_at: timestamp(row.get(6)?),
        size_bytes: row.get::<_, i64>(7)? as usize,
        tags,
        metadata: EntryMetadata {
            subject_id: row.get(9)?,
            kind: row.get(10)?,
            version: row.get(11)?,
        },
    })
}
