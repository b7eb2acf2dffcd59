use crate::config::types::Config;
use crate::config::validation::validate_crawl_config;
use crate::url::{normalize_url, session_name_for, ScopeFilter};
use crate::HarvestError;
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

/// Effective settings of one crawl, fixed for its whole lifetime
#[derive(Debug, Clone)]
pub struct CrawlSession {
    /// Normalized seed URL
    pub seed_url: Url,

    /// Dataset name derived from the seed host
    pub name: String,

    pub max_requests: u32,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub max_duration: Option<Duration>,
}

impl CrawlSession {
    /// Builds the session from validated config and a raw seed string
    ///
    /// An empty or malformed seed is an input error; nothing is crawled.
    pub fn from_config(config: &Config, seed: &str) -> Result<Self, HarvestError> {
        let seed = seed.trim();
        if seed.is_empty() {
            return Err(HarvestError::Input("URL cannot be empty".to_string()));
        }

        let seed_url = normalize_url(seed)
            .map_err(|e| HarvestError::Input(format!("invalid seed URL '{}': {}", seed, e)))?;

        validate_crawl_config(&config.crawl)?;

        let crawl = &config.crawl;
        Ok(Self {
            name: session_name_for(&seed_url),
            seed_url,
            max_requests: crawl.max_requests,
            concurrency: crawl.concurrency,
            request_timeout: Duration::from_secs(crawl.request_timeout_secs),
            max_duration: crawl.max_duration_secs.map(Duration::from_secs),
        })
    }

    /// Same-hostname scope bound to this session's seed
    pub fn scope(&self) -> ScopeFilter {
        ScopeFilter::new(&self.seed_url)
    }

    /// Hex SHA-256 over the settings that shape the crawl
    ///
    /// Stored with the dataset session so two runs can be told apart.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.seed_url.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.max_requests.to_le_bytes());
        hasher.update((self.concurrency as u64).to_le_bytes());
        hasher.update(self.request_timeout.as_millis().to_le_bytes());
        match self.max_duration {
            Some(cap) => hasher.update(cap.as_millis().to_le_bytes()),
            None => hasher.update(b"none"),
        }
        hex::encode(hasher.finalize())
    }
}
