//! Headless browser renderer over the WebDriver protocol
//!
//! Browser sessions are opened lazily, on the first render that needs one,
//! and pooled for reuse. A session is only returned to the pool after a
//! render completes; a render that errors or is cancelled by a timeout
//! closes its session in the background.

use super::{ensure_http, RenderError, RenderedDocument, Renderer};
use crate::config::DEFAULT_WEBDRIVER_URL;
use async_trait::async_trait;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const IMAGE_SIZES_SCRIPT: &str =
    "return Array.from(document.images).map(function (img) { return [img.width, img.height]; });";
const CONTENT_TYPE_SCRIPT: &str = "return document.contentType || '';";

/// Picks the WebDriver endpoint: explicit setting, then `WEBDRIVER_URL`, then localhost
pub fn resolve_webdriver_url(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("WEBDRIVER_URL").ok())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string())
}

/// Session capabilities that keep Chrome and Firefox windowless
pub fn headless_capabilities(headless: bool) -> Capabilities {
    let mut caps = Capabilities::new();
    if headless {
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );
    }
    caps
}

/// Renderer backed by a pool of WebDriver sessions
pub struct WebDriverRenderer {
    endpoint: String,
    headless: bool,
    max_idle: usize,
    idle: Mutex<Vec<Client>>,
}

impl WebDriverRenderer {
    /// Creates the renderer; no connection is made until the first render
    pub fn new(endpoint: String, headless: bool, max_sessions: usize) -> Self {
        Self {
            endpoint,
            headless,
            max_idle: max_sessions.max(1),
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn idle(&self) -> MutexGuard<'_, Vec<Client>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn connect(&self) -> Result<Client, RenderError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(headless_capabilities(self.headless));

        match builder.connect(&self.endpoint).await {
            Ok(client) => {
                info!("Opened WebDriver session at {}", self.endpoint);
                Ok(client)
            }
            Err(e) => {
                warn!("Failed to connect to WebDriver at {}: {}", self.endpoint, e);
                Err(RenderError::Navigation(format!(
                    "WebDriver unavailable at {}: {}",
                    self.endpoint, e
                )))
            }
        }
    }

    async fn lease(&self) -> Result<SessionLease<'_>, RenderError> {
        let pooled = self.idle().pop();
        let client = match pooled {
            Some(client) => client,
            None => self.connect().await?,
        };
        Ok(SessionLease {
            owner: self,
            client: Some(client),
            healthy: false,
        })
    }
}

/// A session checked out of the pool
///
/// Returned to the pool only when marked healthy; otherwise closed on drop.
struct SessionLease<'a> {
    owner: &'a WebDriverRenderer,
    client: Option<Client>,
    healthy: bool,
}

impl SessionLease<'_> {
    fn client(&self) -> Result<&Client, RenderError> {
        self.client
            .as_ref()
            .ok_or_else(|| RenderError::Navigation("session already released".to_string()))
    }
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };

        if self.healthy {
            let mut idle = self.owner.idle();
            if idle.len() < self.owner.max_idle {
                idle.push(client);
                return;
            }
        }

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = client.close().await {
                    debug!("Failed to close WebDriver session: {}", e);
                }
            });
        }
    }
}

fn classify(error: CmdError, timeout: Duration) -> RenderError {
    match &error {
        CmdError::Standard(wd) if wd.error == ErrorStatus::Timeout => RenderError::Timeout(timeout),
        CmdError::Standard(wd) if wd.error == ErrorStatus::InvalidArgument => {
            RenderError::InvalidUrl(error.to_string())
        }
        _ => RenderError::Navigation(error.to_string()),
    }
}

fn is_renderable(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.eq_ignore_ascii_case("text/html")
        || content_type.eq_ignore_ascii_case("application/xhtml+xml")
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<RenderedDocument, RenderError> {
        ensure_http(url)?;

        let mut lease = self.lease().await?;
        let client = lease.client()?;

        client
            .goto(url.as_str())
            .await
            .map_err(|e| classify(e, timeout))?;

        let content_type = client
            .execute(CONTENT_TYPE_SCRIPT, vec![])
            .await
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if !is_renderable(&content_type) {
            lease.healthy = true;
            return Err(RenderError::UnsupportedContent(content_type));
        }

        let final_url = client
            .current_url()
            .await
            .map_err(|e| classify(e, timeout))?;
        let html = client.source().await.map_err(|e| classify(e, timeout))?;
        let title = client.title().await.ok();
        let image_sizes = client
            .execute(IMAGE_SIZES_SCRIPT, vec![])
            .await
            .ok()
            .and_then(|v| serde_json::from_value::<Vec<(u32, u32)>>(v).ok());

        lease.healthy = true;
        debug!("Rendered {} ({} bytes)", final_url, html.len());

        Ok(RenderedDocument {
            final_url,
            title,
            html,
            image_sizes,
        })
    }

    async fn shutdown(&self) {
        let sessions: Vec<Client> = self.idle().drain(..).collect();
        if sessions.is_empty() {
            return;
        }

        debug!("Closing {} WebDriver sessions", sessions.len());
        for client in sessions {
            if let Err(e) = client.close().await {
                warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}
