use crate::config::types::{CrawlSettings, CrawlerConfig, ExtractionConfig, IdentityConfig};
use crate::extract::{get_template, validate_path_query, validate_selector};
use crate::ConfigError;
use url::Url;

/// Validates the entire settings structure
pub fn validate(settings: &CrawlSettings) -> Result<(), ConfigError> {
    validate_crawler_config(&settings.crawler)?;
    validate_identity_config(&settings.identity)?;
    validate_extraction_config(&settings.extraction)?;
    validate_output_config(&settings.output)?;
    Ok(())
}

/// Validates crawl budget and pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates request identity settings
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.rotate_user_agents && config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "rotate_user_agents requires a non-empty user_agents list".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    for name in config.headers.keys() {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "header name must contain only alphanumeric characters and hyphens, got '{}'",
                name
            )));
        }
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates selector rules and the template name
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if let Some(name) = &config.template {
        if get_template(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown selector template '{}'",
                name
            )));
        }
    }

    for selector in config.selectors.iter().chain(&config.exclude_selectors) {
        validate_selector(selector).map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;
    }

    for query in config.queries.iter().chain(&config.exclude_queries) {
        validate_path_query(query).map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a seed or explicit crawl URL
///
/// Only absolute http(s) URLs with a host are accepted.
pub fn validate_seed_url(seed: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("URL '{}' has no host", seed)));
    }

    Ok(url)
}
