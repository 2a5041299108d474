//! Structural content extraction
//!
//! Pulls main-content text out of raw markup using CSS selectors and a small
//! path-query language, with per-genre rule templates.

mod extractor;
mod path_query;
mod templates;

pub use extractor::{dedup_key, SelectorExtractor, SelectorRules, SelectorTestReport};
pub use path_query::PathQuery;
pub use templates::{get_template, template_names, SelectorTemplate, TEMPLATES};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of structural rule to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// CSS selectors only
    #[serde(alias = "css")]
    Selector,
    /// Path queries only
    #[serde(alias = "xpath")]
    PathQuery,
    /// Both, with duplicate blocks removed
    #[default]
    #[serde(alias = "auto")]
    Combined,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selector => "selector",
            Self::PathQuery => "path-query",
            Self::Combined => "combined",
        }
    }
}

impl std::str::FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "selector" | "css" => Ok(Self::Selector),
            "path-query" | "xpath" => Ok(Self::PathQuery),
            "combined" | "auto" => Ok(Self::Combined),
            other => Err(format!(
                "expected 'selector', 'path-query' or 'combined', got '{}'",
                other
            )),
        }
    }
}

/// Errors raised while checking extraction rules
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("invalid path query '{query}': {message}")]
    InvalidQuery { query: String, message: String },
}

/// Checks that a CSS selector parses
pub fn validate_selector(selector: &str) -> Result<(), ExtractError> {
    scraper::Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            message: e.to_string(),
        })
}

/// Checks that a path query is within the supported subset
pub fn validate_path_query(query: &str) -> Result<(), ExtractError> {
    PathQuery::parse(query).map(|_| ())
}
