//! Fetch collaborator
//!
//! The crawler never talks to the network directly. Discovery and capture
//! shape a [`FetchRequest`] and hand it to a [`PageFetcher`]; the built-in
//! [`HttpFetcher`] serves static pages, and browser-backed implementations
//! can honour the script and overlay policies as well.

mod http;
mod page;
mod render;
mod request;

use async_trait::async_trait;
use thiserror::Error;

pub use http::{build_http_client, HttpFetcher, DEFAULT_CACHE_CAPACITY};
pub use page::{FetchedPage, PageLinks, PageMetadata};
pub use render::{extract_links, extract_metadata, render_fallback_text, render_markdown};
pub use request::{
    FetchRequest, MarkdownOptions, WaitPolicy, CAPTURE_EXCLUDED_TAGS, CAPTURE_SCRIPT,
    CAPTURE_TIMEOUT, CAPTURE_WORD_THRESHOLD,
};

/// Errors reported by a fetch collaborator
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Unsupported content type '{content_type}' at {url}")]
    NotHtml { url: String, content_type: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Page load failed: {0}")]
    Reported(String),

    #[error("Fetcher unavailable: {0}")]
    Unavailable(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | Timeout | yes |
    /// | HTTP 429, 5xx | yes |
    /// | Other HTTP status | no |
    /// | Connection refused | no |
    /// | Unsupported content | no |
    /// | Collaborator-reported failure | yes |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Request { .. } | Self::Reported(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Connect { .. } | Self::NotHtml { .. } | Self::Unavailable(_) => false,
        }
    }
}

/// The page-loading capability the crawler depends on
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Checks the collaborator can serve requests at all
    ///
    /// A failure here aborts the run before any page is requested.
    async fn ensure_ready(&self) -> Result<(), FetchError> {
        Ok(())
    }

    /// Loads and renders one page
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError>;
}
