//! Static HTTP renderer
//!
//! Fetches the page body without executing scripts. Used when no WebDriver
//! server is available and by the integration tests.

use super::{ensure_http, RenderError, RenderedDocument, Renderer};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// Follows at most 10 redirects and accepts gzip and brotli bodies. The
/// overall deadline is set per request by the caller.
///
/// # Example
///
/// ```no_run
/// use page_harvest::crawler::build_http_client;
///
/// let client = build_http_client("page-harvest/1.0").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer backed by a plain HTTP GET
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
        })
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout(timeout)
    } else if error.is_builder() {
        RenderError::InvalidUrl(error.to_string())
    } else {
        // Connection refused, TLS failures, redirect loops and reset bodies
        RenderError::Navigation(error.to_string())
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<RenderedDocument, RenderError> {
        ensure_http(url)?;

        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RenderError::Navigation(format!("HTTP {}", status.as_u16())));
        }

        // A missing header is treated as HTML, like a browser sniffing the body
        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(RenderError::UnsupportedContent(content_type.to_string()));
            }
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| classify(e, timeout))?;
        debug!("Fetched {} ({} bytes, HTTP {})", final_url, html.len(), status.as_u16());

        Ok(RenderedDocument {
            final_url,
            title: None,
            html,
            image_sizes: None,
        })
    }
}
