use crate::config::mapping::settings_to_map;
use crate::config::types::CrawlSettings;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a settings file from the given path
///
/// Every section is optional; missing keys fall back to their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML settings file
///
/// # Returns
///
/// * `Ok(CrawlSettings)` - Successfully loaded and validated settings
/// * `Err(ConfigError)` - Failed to load, parse, or validate the settings
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pagesift::config::load_settings;
///
/// let settings = load_settings(Path::new("pagesift.toml")).unwrap();
/// println!("Max depth: {}", settings.crawler.max_depth);
/// ```
pub fn load_settings(path: &Path) -> Result<CrawlSettings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parses and validates settings from TOML text
pub fn parse_settings(content: &str) -> Result<CrawlSettings, ConfigError> {
    let settings: CrawlSettings = toml::from_str(content)?;
    validate(&settings)?;
    Ok(settings)
}

/// Computes a SHA-256 fingerprint of the effective settings
///
/// The fingerprint is taken over the flattened settings map, so two runs with
/// the same effective settings share a fingerprint regardless of how the
/// values were supplied (file, defaults or CLI overrides).
///
/// # Returns
///
/// Hex-encoded SHA-256 digest (64 characters)
pub fn settings_fingerprint(settings: &CrawlSettings) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in settings_to_map(settings) {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
