//! Single-file JSON export of a finished dataset
//!
//! The export reads every record of a session, drops the excluded top-level
//! fields and writes one pretty-printed JSON array to
//! `<export_dir>/<session>.json`. The dataset itself is never modified.

use crate::storage::{DatasetStore, StorageError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Fields dropped from every export unless configured otherwise
///
/// `h1` was written by older extractors; current records never contain it.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] = &["h1"];

/// Errors that can occur while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to read dataset: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to serialize records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Removes the named top-level fields from one exported object
fn strip_fields(mut item: Value, exclude_fields: &[impl AsRef<str>]) -> Value {
    if let Value::Object(map) = &mut item {
        map.retain(|key, _| !exclude_fields.iter().any(|f| f.as_ref() == key));
    }
    item
}

/// Exports a session's records to a single JSON file
///
/// Running the export again overwrites the file with byte-identical content
/// as long as the dataset has not changed. An empty dataset produces `[]`.
///
/// # Arguments
///
/// * `store` - Dataset to read from
/// * `session` - Session (dataset) name; also the file stem
/// * `exclude_fields` - Top-level fields removed from every record
/// * `export_dir` - Target directory, created when missing
///
/// # Returns
///
/// The path of the written file
pub fn export_dataset(
    store: &dyn DatasetStore,
    session: &str,
    exclude_fields: &[impl AsRef<str>],
    export_dir: &Path,
) -> ExportResult<PathBuf> {
    let items: Vec<Value> = store
        .read_all_json(session)?
        .into_iter()
        .map(|item| strip_fields(item, exclude_fields))
        .collect();
    let count = items.len();
    let json = serde_json::to_string_pretty(&Value::Array(items))?;

    std::fs::create_dir_all(export_dir).map_err(|source| ExportError::Write {
        path: export_dir.to_path_buf(),
        source,
    })?;

    let path = export_dir.join(format!("{}.json", session));
    let staging = export_dir.join(format!(".{}.json.tmp", session));

    std::fs::write(&staging, json.as_bytes()).map_err(|source| ExportError::Write {
        path: staging.clone(),
        source,
    })?;
    std::fs::rename(&staging, &path).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    debug!("Wrote {} bytes to {}", json.len(), path.display());
    info!("Exported {} records to {}", count, path.display());
    Ok(path)
}
