//! Storage module for the crawl dataset
//!
//! This module handles persistence of extracted page records:
//! - SQLite database initialization and schema management
//! - Session tracking (seed, settings fingerprint, status)
//! - Append-only record storage with ordered read-back

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteDataset;
pub use traits::{DatasetStore, StorageError, StorageResult};

use serde::{Deserialize, Serialize};

/// Structured content extracted from one page
///
/// Serialized field names and order are part of the export format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub paragraphs: Vec<String>,
    pub links: Vec<LinkEntry>,
    pub images: Vec<ImageEntry>,
}

/// An anchor found on a page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkEntry {
    /// Absolute URL, or `""` when the anchor has no href
    pub href: String,
    pub text: String,
}

/// An image found on a page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageEntry {
    pub src: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

/// What is known about a session when it starts
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub name: String,
    pub seed_url: String,
    pub config_hash: String,
}

/// Represents a dataset session as stored
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub name: String,
    pub seed_url: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: SessionStatus,
}

/// Status of a dataset session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl SessionStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
