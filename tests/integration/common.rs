//! Shared fakes and helpers

use async_trait::async_trait;
use pagesift::config::CrawlSettings;
use pagesift::fetch::{FetchError, FetchRequest, FetchedPage, PageFetcher, PageLinks, PageMetadata};
use pagesift::output::{
    CrawlSummary, ExtractionResult, FileOutput, OutputError, OutputHandler, OutputResult,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const ARTICLE: &str = "Skip to content\nHome | Docs | Blog\n# Configuring the scheduler\nThe scheduler reads its queue limits from the settings file at startup and applies them to every worker it spawns.\n## Limits\n- max-jobs caps the number of queued jobs\n© 2024 Example Corp";

/// Settings with no pacing and no retries
pub fn fast_settings() -> CrawlSettings {
    let mut settings = CrawlSettings::default();
    settings.crawler.delay_ms = 0;
    settings.crawler.retry_attempts = 0;
    settings
}

/// In-memory fetcher driven by a link graph
///
/// Every URL serves [`ARTICLE`]. URLs listed as failing return an error,
/// and each fetch can be slowed down to make overlap observable.
#[derive(Default)]
pub struct ScriptedFetcher {
    links: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    latency: Duration,
    cancel_on_call: Option<(usize, CancellationToken)>,

    pub calls: AtomicUsize,
    pub captures: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(mut self, from: &str, to: &[&str]) -> Self {
        self.links
            .insert(from.to_string(), to.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Cancels `token` during the `call`-th fetch (1-based)
    pub fn cancel_on_call(mut self, call: usize, token: CancellationToken) -> Self {
        self.cancel_on_call = Some((call, token));
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if request.is_capture() {
            self.captures.fetch_add(1, Ordering::SeqCst);
        }
        self.requested.lock().unwrap().push(request.url.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some((at, token)) = &self.cancel_on_call {
            if *at == call {
                token.cancel();
            }
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let url = request.url.to_string();
        if self.failing.contains(&url) {
            return Err(FetchError::Status { url, status: 503 });
        }

        Ok(FetchedPage {
            links: PageLinks {
                internal: self.links.get(&url).cloned().unwrap_or_default(),
                external: Vec::new(),
            },
            metadata: PageMetadata {
                title: Some("Configuring the scheduler".to_string()),
                description: None,
            },
            url,
            success: true,
            markdown: ARTICLE.to_string(),
            ..Default::default()
        })
    }
}

/// File output that refuses to write some documents
pub struct FlakyOutput {
    inner: FileOutput,
    refuse: String,
}

impl FlakyOutput {
    pub fn new(inner: FileOutput, refuse: &str) -> Self {
        Self {
            inner,
            refuse: refuse.to_string(),
        }
    }
}

#[async_trait]
impl OutputHandler for FlakyOutput {
    fn directory(&self) -> &Path {
        self.inner.directory()
    }

    fn projected_path(&self, url: &str) -> PathBuf {
        self.inner.projected_path(url)
    }

    async fn prepare(&self) -> OutputResult<()> {
        self.inner.prepare().await
    }

    async fn persist(&self, result: &ExtractionResult) -> OutputResult<PathBuf> {
        if result.url.contains(&self.refuse) {
            return Err(OutputError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only file",
            )));
        }
        self.inner.persist(result).await
    }

    async fn write_summary(&self, summary: &CrawlSummary) -> OutputResult<PathBuf> {
        self.inner.write_summary(summary).await
    }
}
