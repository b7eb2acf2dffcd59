//! Page rendering backends
//!
//! A renderer turns a URL into a rendered document: the final URL after
//! redirects, the page title and a snapshot of the DOM. The crawl engine only
//! sees the `Renderer` trait.

mod http;
mod webdriver;

pub use http::{build_http_client, HttpRenderer};
pub use webdriver::{headless_capabilities, resolve_webdriver_url, WebDriverRenderer};

use crate::config::{RendererConfig, RendererKind};
use crate::HarvestError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

/// Snapshot of a page after it finished loading
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// URL after redirects
    pub final_url: Url,

    /// Title as reported by the browser, when it reports one
    pub title: Option<String>,

    /// Serialized DOM
    pub html: String,

    /// Rendered `(width, height)` of every `<img>` in document order
    pub image_sizes: Option<Vec<(u32, u32)>>,
}

/// Errors a render attempt can end with
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),
}

impl RenderError {
    /// Timeouts and navigation failures get one more attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Navigation(_))
    }
}

/// Rendering capability consumed by the crawl engine
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Loads `url` and returns the rendered document
    async fn render(&self, url: &Url, timeout: Duration) -> Result<RenderedDocument, RenderError>;

    /// Releases sessions held by the renderer
    async fn shutdown(&self) {}
}

/// Rejects anything a browser should not be pointed at
pub(crate) fn ensure_http(url: &Url) -> Result<(), RenderError> {
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        _ => Err(RenderError::InvalidUrl(url.to_string())),
    }
}

/// Builds the renderer selected in the configuration
///
/// `lanes` bounds how many browser sessions the WebDriver backend keeps.
pub fn build_renderer(
    config: &RendererConfig,
    lanes: usize,
) -> Result<Arc<dyn Renderer>, HarvestError> {
    match config.kind {
        RendererKind::Webdriver => {
            let endpoint = resolve_webdriver_url(config.webdriver_url.as_deref());
            let renderer = WebDriverRenderer::new(endpoint, config.headless, lanes);
            info!("Rendering through WebDriver at {}", renderer.endpoint());
            Ok(Arc::new(renderer))
        }
        RendererKind::Http => {
            let renderer = HttpRenderer::new(&config.user_agent)
                .map_err(|e| HarvestError::Renderer(e.to_string()))?;
            Ok(Arc::new(renderer))
        }
    }
}
