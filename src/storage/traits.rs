//! Storage traits and error types
//!
//! This module defines the trait interface for dataset backends and
//! associated error types.

use crate::storage::{PageRecord, SessionInfo, SessionRecord, SessionStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for dataset backend implementations
///
/// A dataset is an append-only, ordered sequence of page records grouped by
/// session name. Implementations are shared by every crawl lane, so all
/// methods take `&self` and must be safe to call concurrently.
pub trait DatasetStore: Send + Sync {
    // ===== Session Management =====

    /// Starts (or restarts) a session
    ///
    /// Records left behind by an earlier run with the same name are removed,
    /// so every crawl starts from an empty dataset.
    fn begin_session(&self, info: &SessionInfo) -> StorageResult<()>;

    /// Marks a session finished with the given status
    fn finish_session(&self, name: &str, status: SessionStatus) -> StorageResult<()>;

    /// Gets a session's metadata
    fn get_session(&self, name: &str) -> StorageResult<Option<SessionRecord>>;

    // ===== Records =====

    /// Appends one record atomically
    fn append(&self, session: &str, record: &PageRecord) -> StorageResult<()>;

    /// Reads every stored record as raw JSON, in append order
    ///
    /// Raw values keep any field an older writer stored, which the exporter
    /// may need to strip.
    fn read_all_json(&self, session: &str) -> StorageResult<Vec<serde_json::Value>>;

    /// Reads every record in append order
    fn read_all(&self, session: &str) -> StorageResult<Vec<PageRecord>> {
        self.read_all_json(session)?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StorageError::from))
            .collect()
    }

    /// Number of records in a session
    fn count(&self, session: &str) -> StorageResult<u64>;
}
