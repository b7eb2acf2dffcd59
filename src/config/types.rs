use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Main configuration structure for Page-Harvest
///
/// Every table and key is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlConfig {
    /// Seed URL; the CLI argument or prompt is used when absent
    #[serde(default)]
    pub seed_url: Option<String>,

    /// Maximum number of requests admitted over the whole crawl
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Number of concurrent crawl lanes
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-render timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional wall-clock cap for the whole crawl
    #[serde(default)]
    pub max_duration_secs: Option<u64>,
}

/// Which rendering backend drives page loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless browser over the WebDriver protocol
    #[default]
    Webdriver,
    /// Static HTTP fetch, no script execution
    Http,
}

/// Rendering backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RendererConfig {
    #[serde(default)]
    pub kind: RendererKind,

    /// WebDriver endpoint; falls back to `WEBDRIVER_URL`, then localhost:4444
    #[serde(default)]
    pub webdriver_url: Option<String>,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User-Agent header sent by the HTTP renderer
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    /// Root directory for the dataset database and the exports
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Top-level fields removed from every exported record
    #[serde(default = "default_exclude_fields")]
    pub exclude_fields: Vec<String>,
}

impl OutputConfig {
    /// Path of the SQLite dataset file
    pub fn dataset_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_dir).join("datasets.db")
    }

    /// Directory receiving `<session>.json` exports
    pub fn export_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage_dir).join("exports")
    }
}

pub const DEFAULT_MAX_REQUESTS: u32 = 50;
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

fn default_concurrency() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("page-harvest/{}", env!("CARGO_PKG_VERSION"))
}

fn default_storage_dir() -> String {
    "./storage".to_string()
}

fn default_exclude_fields() -> Vec<String> {
    vec!["h1".to_string()]
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: None,
            max_requests: default_max_requests(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            max_duration_secs: None,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::default(),
            webdriver_url: None,
            headless: default_headless(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            exclude_fields: default_exclude_fields(),
        }
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webdriver => f.write_str("webdriver"),
            Self::Http => f.write_str("http"),
        }
    }
}

impl FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "webdriver" | "browser" => Ok(Self::Webdriver),
            "http" => Ok(Self::Http),
            other => Err(format!(
                "unknown renderer '{}', expected 'webdriver' or 'http'",
                other
            )),
        }
    }
}
