//! Output handler trait and the per-run result types

use crate::clean::ContentSource;
use crate::crawler::DiscoveryOutcome;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Outcome of fetching and cleaning one page
///
/// `success` is false exactly when an error is recorded; both are only
/// reachable through the constructors and [`ExtractionResult::mark_failed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    pub title: String,
    pub description: String,

    /// Cleaned body; persisted to the document, not to the summary
    #[serde(skip)]
    pub content: String,

    /// Length of the fetcher's rendering before cleaning
    pub raw_content_length: usize,

    /// Length of the cleaned body
    pub content_length: usize,

    /// Outbound links reported by the fetcher
    pub link_count: usize,

    pub content_source: Option<ContentSource>,
    pub crawled_at: DateTime<Utc>,
    pub output_path: Option<PathBuf>,

    success: bool,
    error: Option<String>,
}

impl ExtractionResult {
    pub fn succeeded(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        content: String,
        content_source: ContentSource,
        raw_content_length: usize,
        link_count: usize,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: description.into(),
            content_length: content.chars().count(),
            content,
            raw_content_length,
            link_count,
            content_source: Some(content_source),
            crawled_at: Utc::now(),
            output_path: None,
            success: true,
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            description: String::new(),
            content: String::new(),
            raw_content_length: 0,
            content_length: 0,
            link_count: 0,
            content_source: None,
            crawled_at: Utc::now(),
            output_path: None,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Turns a result into a failure, e.g. when it could not be persisted
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.success = false;
        self.error = Some(error.into());
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// A URL that could not be crawled, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub error: String,
}

/// Aggregate statistics for one crawl run
///
/// Built incrementally by the crawl aggregator and written once at the end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub settings_fingerprint: String,

    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// URLs never attempted because the run was interrupted
    pub cancelled: usize,
    pub total_content_length: usize,

    pub output_directory: PathBuf,
    pub results: Vec<ExtractionResult>,
    pub failures: Vec<FailureRecord>,

    /// Present for runs that started with a discovery phase
    pub discovery: Option<DiscoveryOutcome>,
}

impl CrawlSummary {
    /// Creates an empty summary for `total` URLs
    pub fn new(total: usize, output_directory: PathBuf, settings_fingerprint: String) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            duration_seconds: None,
            settings_fingerprint,
            total,
            successful: 0,
            failed: 0,
            cancelled: 0,
            total_content_length: 0,
            output_directory,
            results: Vec::new(),
            failures: Vec::new(),
            discovery: None,
        }
    }

    /// Appends one page's outcome
    pub fn record(&mut self, result: ExtractionResult) {
        match result.error() {
            None => {
                self.successful += 1;
                self.total_content_length += result.content_length;
            }
            Some(error) => {
                self.failed += 1;
                self.failures.push(FailureRecord {
                    url: result.url.clone(),
                    error: error.to_string(),
                });
            }
        }
        self.results.push(result);
    }

    /// Stamps the finish time; URLs without a result count as cancelled
    pub fn finish(&mut self) {
        let finished = Utc::now();
        self.duration_seconds =
            Some((finished - self.started_at).num_milliseconds().max(0) as f64 / 1000.0);
        self.finished_at = Some(finished);
        self.cancelled = self.total.saturating_sub(self.successful + self.failed);
    }

    /// Number of URLs with a recorded outcome
    pub fn completed(&self) -> usize {
        self.successful + self.failed
    }

    /// Returns the success rate as a percentage of attempted URLs
    pub fn success_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        (self.successful as f64 / completed as f64) * 100.0
    }
}

/// Destination for crawl documents and the run summary
///
/// Implementations must tolerate concurrent `persist` calls for different
/// URLs.
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Root directory for everything this handler writes
    fn directory(&self) -> &Path;

    /// Path a document for `url` would be written to
    fn projected_path(&self, url: &str) -> PathBuf;

    /// Creates the output location; failure here is fatal for a run
    async fn prepare(&self) -> OutputResult<()>;

    /// Writes one document and returns where it went
    async fn persist(&self, result: &ExtractionResult) -> OutputResult<PathBuf>;

    /// Writes the aggregate summary artifact
    async fn write_summary(&self, summary: &CrawlSummary) -> OutputResult<PathBuf>;
}
