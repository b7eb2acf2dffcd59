//! URL handling module for Page-Harvest
//!
//! This module provides URL normalization (crawl identity), host extraction,
//! session naming and the same-hostname scope filter.

mod domain;
mod normalize;
mod scope;

pub use domain::{extract_host, session_name_for};
pub use normalize::{normalize_parsed, normalize_url};
pub use scope::{is_in_scope, ScopeFilter};
