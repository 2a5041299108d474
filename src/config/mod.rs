//! Configuration module for pagesift
//!
//! This module handles loading, validating and overriding crawl settings.
//!
//! # Example
//!
//! ```no_run
//! use pagesift::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("pagesift.toml")).unwrap();
//! println!("Crawler will use max depth: {}", settings.crawler.max_depth);
//! ```

mod mapping;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CleaningConfig, CrawlSettings, CrawlerConfig, ExtractionConfig, IdentityConfig, OutputConfig,
    OutputLayout, DEFAULT_USER_AGENTS,
};

// Re-export functions
pub use mapping::{
    apply_setting, parse_assignment, settings_from_map, settings_to_map, SETTING_KEYS,
};
pub use parser::{load_settings, parse_settings, settings_fingerprint};
pub use validation::{validate, validate_seed_url};
