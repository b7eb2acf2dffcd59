//! Configuration module for Page-Harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and turns the result into the immutable settings of
//! one crawl (`CrawlSession`).
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::config::{load_config, CrawlSession};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! let session = CrawlSession::from_config(&config, "https://example.com").unwrap();
//! println!("Crawling {} with {} lanes", session.seed_url, session.concurrency);
//! ```

mod parser;
mod session;
mod types;
mod validation;

// Re-export types
pub use session::CrawlSession;
pub use types::{
    Config, CrawlConfig, OutputConfig, RendererConfig, RendererKind, DEFAULT_MAX_REQUESTS,
    DEFAULT_WEBDRIVER_URL,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
