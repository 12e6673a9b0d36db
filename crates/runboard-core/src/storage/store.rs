//! ResultStore: SQLite-backed pipeline run store.
//!
//! Provides:
//! - Idempotent upserts that never touch a terminal row
//! - All-or-nothing batch ingestion
//! - Latest-run resolution with numeric run id ordering

use super::schema::RUNS_SCHEMA;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database configuration error: {message}")]
    Config { message: String },

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Where a database URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parse a database URL.
    ///
    /// | URL | Location |
    /// |-----|----------|
    /// | `sqlite://`, `sqlite::memory:`, `sqlite:///:memory:` | in-memory |
    /// | `sqlite:///runs.db` | relative path `runs.db` |
    /// | `sqlite:////var/lib/runs.db` | absolute path `/var/lib/runs.db` |
    /// | `/var/lib/runs.db`, `runs.db` | bare path |
    pub fn parse(database_url: &str) -> Result<Self, StoreError> {
        let url = database_url.trim();
        if url.is_empty() {
            return Err(StoreError::Config {
                message: "no database connection URL provided".to_string(),
            });
        }

        if url == "sqlite://" || url == "sqlite::memory:" || url == "sqlite:///:memory:" {
            return Ok(Self::Memory);
        }

        if let Some(path) = url.strip_prefix("sqlite:///") {
            return Ok(Self::File(PathBuf::from(path)));
        }

        if let Some(path) = url.strip_prefix("sqlite://") {
            return Ok(Self::File(PathBuf::from(path)));
        }

        if let Some((scheme, _)) = url.split_once("://") {
            return Err(StoreError::Config {
                message: format!(
                    "unsupported database scheme '{}': expected sqlite://",
                    scheme
                ),
            });
        }

        Ok(Self::File(PathBuf::from(url)))
    }
}

/// SQLite-backed run store.
///
/// Cloning shares the underlying connection; hand clones to every component
/// that needs persistence instead of keeping a global session.
#[derive(Clone)]
pub struct ResultStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl ResultStore {
    /// Open a store from a database URL (see [`DatabaseLocation::parse`]).
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        match DatabaseLocation::parse(database_url)? {
            DatabaseLocation::Memory => Self::memory(),
            DatabaseLocation::File(path) => Self::open(&path),
        }
    }

    /// Open a file-backed store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!(path = %path.display(), "opening run store");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing).
    pub fn memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Create store from existing connection (for multi-connection tests).
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_connection(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_connection(conn: &Connection) -> Result<(), StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL mode for file-backed DBs (reports "memory" for in-memory ones)
        let _: Result<String, _> =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0));
        conn.execute_batch(RUNS_SCHEMA)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Total number of stored runs.
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM pipeline_runs", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
