//! Crawler module for page rendering and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - The frontier with URL deduplication and the request budget
//! - Rendering backends (WebDriver browser, static HTTP)
//! - Structured extraction of page records
//! - Overall crawl coordination across concurrent lanes

mod coordinator;
mod extractor;
pub mod frontier;
pub mod renderer;

pub use coordinator::{Coordinator, ShutdownHandle, MAX_ATTEMPTS};
pub use extractor::extract;
pub use frontier::{AdmitOutcome, CrawlRequest, Frontier, FrontierSnapshot};
pub use renderer::{
    build_http_client, build_renderer, HttpRenderer, RenderError, RenderedDocument, Renderer,
    WebDriverRenderer,
};
