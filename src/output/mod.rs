//! Output module for crawl results
//!
//! This module handles:
//! - Exporting a dataset session to a single JSON file
//! - Reporting crawl counters at the end of a run

mod export;
pub mod stats;

pub use export::{export_dataset, ExportError, ExportResult, DEFAULT_EXCLUDED_FIELDS};
pub use stats::{print_report, CrawlReport, StopReason};
