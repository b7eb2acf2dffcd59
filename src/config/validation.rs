use crate::config::types::{Config, CrawlConfig, OutputConfig, RendererConfig};
use crate::url::normalize_url;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_renderer_config(&config.renderer)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl configuration
///
/// `max_requests = 0` is legal and produces an empty dataset.
pub(crate) fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_duration_secs must be >= 1 when set".to_string(),
        ));
    }

    if let Some(seed) = &config.seed_url {
        normalize_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed_url '{}': {}", seed, e)))?;
    }

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.webdriver_url {
        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid webdriver_url '{}': {}", endpoint, e))
        })?;
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.storage_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage_dir cannot be empty".to_string(),
        ));
    }

    if let Some(field) = config.exclude_fields.iter().find(|f| f.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "exclude_fields contains an empty name: {:?}",
            field
        )));
    }

    Ok(())
}
