//! pagesift: discover, fetch and distill web pages into clean documents
//!
//! This crate walks a site breadth-first from a seed URL, fetches each admitted
//! page through a pluggable fetch collaborator, and separates main content from
//! navigation, footers and other page chrome before persisting the result.

pub mod clean;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pagesift operations
///
/// Only run-level conditions surface here. Per-URL problems (fetch failures,
/// unwritable documents) are recorded in the crawl summary instead.
#[derive(Debug, Error)]
pub enum SiftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch collaborator unavailable: {0}")]
    FetcherUnavailable(String),

    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for setting '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for pagesift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use clean::{CleanerConfig, CleaningProfile, ContentCleaner};
pub use config::CrawlSettings;
pub use crawler::{CrawlOrchestrator, CrawlPlan, RunReport};
pub use extract::SelectorExtractor;
pub use fetch::{FetchRequest, FetchedPage, HttpFetcher, PageFetcher};
pub use output::{CrawlSummary, ExtractionResult};
pub use url::{normalize_url, PatternMatcher};
