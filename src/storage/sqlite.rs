//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the DatasetStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DatasetStore, StorageError, StorageResult};
use crate::storage::{PageRecord, SessionInfo, SessionRecord, SessionStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// SQLite dataset backend
///
/// The connection sits behind a mutex so one store can be shared by every
/// crawl lane; each call holds the lock for a single statement or transaction.
pub struct SqliteDataset {
    conn: Mutex<Connection>,
}

impl SqliteDataset {
    /// Opens or creates a dataset file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file; parent directories are created
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteDataset)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        debug!("Opened dataset at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory dataset
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DatasetStore for SqliteDataset {
    // ===== Session Management =====

    fn begin_session(&self, info: &SessionInfo) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let purged = tx.execute("DELETE FROM records WHERE session = ?1", params![info.name])?;
        tx.execute(
            "INSERT INTO sessions (name, seed_url, config_hash, started_at, finished_at, status)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5)
             ON CONFLICT(name) DO UPDATE SET
                seed_url = excluded.seed_url,
                config_hash = excluded.config_hash,
                started_at = excluded.started_at,
                finished_at = NULL,
                status = excluded.status",
            params![
                info.name,
                info.seed_url,
                info.config_hash,
                now,
                SessionStatus::Running.to_db_string()
            ],
        )?;
        tx.commit()?;

        if purged > 0 {
            debug!("Cleared {} records from previous run of '{}'", purged, info.name);
        }
        Ok(())
    }

    fn finish_session(&self, name: &str, status: SessionStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.lock().execute(
            "UPDATE sessions SET status = ?1, finished_at = ?2 WHERE name = ?3",
            params![status.to_db_string(), now, name],
        )?;

        if updated == 0 {
            return Err(StorageError::SessionNotFound(name.to_string()));
        }
        Ok(())
    }

    fn get_session(&self, name: &str) -> StorageResult<Option<SessionRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT name, seed_url, config_hash, started_at, finished_at, status
             FROM sessions WHERE name = ?1",
        )?;

        let session = stmt
            .query_row(params![name], |row| {
                Ok(SessionRecord {
                    name: row.get(0)?,
                    seed_url: row.get(1)?,
                    config_hash: row.get(2)?,
                    started_at: row.get(3)?,
                    finished_at: row.get(4)?,
                    status: SessionStatus::from_db_string(&row.get::<_, String>(5)?)
                        .unwrap_or(SessionStatus::Failed),
                })
            })
            .optional()?;

        Ok(session)
    }

    // ===== Records =====

    fn append(&self, session: &str, record: &PageRecord) -> StorageResult<()> {
        let payload = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();
        self.lock().execute(
            "INSERT INTO records (session, payload, created_at) VALUES (?1, ?2, ?3)",
            params![session, payload, now],
        )?;
        Ok(())
    }

    fn read_all_json(&self, session: &str) -> StorageResult<Vec<serde_json::Value>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT payload FROM records WHERE session = ?1 ORDER BY id ASC")?;

        let payloads = stmt
            .query_map(params![session], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(StorageError::from))
            .collect()
    }

    fn count(&self, session: &str) -> StorageResult<u64> {
        let count: i64 = self.lock().query_row(
            "SELECT COUNT(*) FROM records WHERE session = ?1",
            params![session],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
