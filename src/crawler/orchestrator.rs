//! Crawl orchestration: discovery, then content capture
//!
//! The orchestrator owns the run-level flow. It validates the plan, checks
//! that the fetch collaborator is usable, materializes the URL set (through
//! discovery or from an explicit list) and either reports what would be
//! crawled (dry run) or hands the set to the content crawler.

use super::content::ContentCrawler;
use super::discovery::{DiscoveryOutcome, UrlDiscovery};
use crate::config::{validate_seed_url, CrawlSettings};
use crate::fetch::PageFetcher;
use crate::output::{CrawlSummary, OutputError, OutputHandler};
use crate::url::{normalize_url, PatternMatcher};
use crate::SiftError;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Where the URL set of a run comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlPlan {
    /// Breadth-first discovery from one or more seeds, filtered by patterns
    Discover {
        seeds: Vec<String>,
        include: Vec<String>,
        exclude: Vec<String>,
    },

    /// An explicit URL list; no discovery phase
    Urls(Vec<String>),
}

/// What a dry run would have crawled
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    pub total: usize,
    pub urls: Vec<String>,

    /// Output paths of the first `preview-limit` URLs
    pub preview_paths: Vec<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryOutcome>,
}

/// Outcome of [`CrawlOrchestrator::run`]
#[derive(Debug, Clone)]
pub enum RunReport {
    Dry(DryRunReport),
    Crawled(CrawlSummary),
}

/// Composes discovery and content capture into one run
pub struct CrawlOrchestrator {
    settings: Arc<CrawlSettings>,
    fetcher: Arc<dyn PageFetcher>,
    output: Arc<dyn OutputHandler>,
    cancel: CancellationToken,
    dry_run: bool,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `settings` - Validated crawl settings
    /// * `fetcher` - Fetch collaborator used by both phases
    /// * `output` - Destination for documents and the run summary
    pub fn new(
        settings: CrawlSettings,
        fetcher: Arc<dyn PageFetcher>,
        output: Arc<dyn OutputHandler>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            fetcher,
            output,
            cancel: CancellationToken::new(),
            dry_run: false,
        }
    }

    /// Uses an externally owned cancellation token (e.g. wired to Ctrl-C)
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stops after URL materialization and reports instead of crawling
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Runs a plan to completion
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport::Dry)` - Dry run; no content was fetched or written
    /// * `Ok(RunReport::Crawled)` - Summary of the crawl, also written to disk
    /// * `Err(SiftError)` - Invalid input, unusable fetcher or output directory
    pub async fn run(&self, plan: CrawlPlan) -> Result<RunReport, SiftError> {
        match plan {
            CrawlPlan::Discover {
                seeds,
                include,
                exclude,
            } => {
                let seeds = validate_all(&seeds)?;
                let matcher = PatternMatcher::new(include.as_slice(), exclude.as_slice());

                self.ensure_fetcher().await?;
                let outcome = self.discover(&seeds, &matcher).await;

                if self.dry_run {
                    let urls = outcome.urls.clone();
                    return Ok(RunReport::Dry(self.dry_report(urls, Some(outcome))));
                }

                self.prepare_output().await?;
                let crawler = self.content_crawler();
                Ok(RunReport::Crawled(crawler.crawl_discovered(outcome).await))
            }
            CrawlPlan::Urls(urls) => {
                let urls = dedup(validate_all(&urls)?);

                if self.dry_run {
                    return Ok(RunReport::Dry(self.dry_report(urls, None)));
                }

                self.ensure_fetcher().await?;
                self.prepare_output().await?;
                let crawler = self.content_crawler();
                Ok(RunReport::Crawled(crawler.crawl(&urls).await))
            }
        }
    }

    /// Runs one discovery pass per seed and unions the results
    async fn discover(&self, seeds: &[Url], matcher: &PatternMatcher) -> DiscoveryOutcome {
        let mut combined: Option<DiscoveryOutcome> = None;

        for seed in seeds {
            if self.cancel.is_cancelled() {
                tracing::info!("Interrupted, skipping discovery from {}", seed);
                break;
            }

            let mut discovery =
                UrlDiscovery::new(self.fetcher.clone(), self.settings.clone(), self.cancel.clone());
            let outcome = discovery.discover(seed, matcher).await;

            match combined.as_mut() {
                Some(all) => all.merge(outcome),
                None => combined = Some(outcome),
            }
        }

        let outcome = combined.unwrap_or_default();
        tracing::info!(
            "Discovered {} URLs from {} seed(s) with {} link relationships",
            outcome.urls.len(),
            seeds.len(),
            outcome.relationship_count()
        );
        outcome
    }

    async fn ensure_fetcher(&self) -> Result<(), SiftError> {
        self.fetcher
            .ensure_ready()
            .await
            .map_err(|e| SiftError::FetcherUnavailable(e.to_string()))
    }

    async fn prepare_output(&self) -> Result<(), SiftError> {
        self.output.prepare().await.map_err(|e| match e {
            OutputError::Write { path, source } => SiftError::OutputDirectory { path, source },
            OutputError::Io(source) => SiftError::OutputDirectory {
                path: self.output.directory().to_path_buf(),
                source,
            },
            other => SiftError::Output(other),
        })
    }

    fn content_crawler(&self) -> ContentCrawler {
        ContentCrawler::new(
            self.fetcher.clone(),
            self.output.clone(),
            self.settings.clone(),
            self.cancel.clone(),
        )
    }

    fn dry_report(&self, urls: Vec<String>, discovery: Option<DiscoveryOutcome>) -> DryRunReport {
        let preview_paths = urls
            .iter()
            .take(self.settings.output.preview_limit)
            .map(|url| self.output.projected_path(url))
            .collect();

        tracing::info!("Dry run: {} URLs would be crawled", urls.len());

        DryRunReport {
            total: urls.len(),
            urls,
            preview_paths,
            discovery,
        }
    }
}

/// Validates every URL of a plan; the first invalid one aborts the run
fn validate_all(urls: &[String]) -> Result<Vec<Url>, SiftError> {
    if urls.is_empty() {
        return Err(SiftError::Config(crate::ConfigError::Validation(
            "no URLs given".to_string(),
        )));
    }

    urls.iter()
        .map(|raw| -> Result<Url, SiftError> {
            let url = validate_seed_url(raw.trim())?;
            Ok(normalize_url(url.as_str(), None)?)
        })
        .collect()
}

/// Keeps the first occurrence of each URL
fn dedup(urls: Vec<Url>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
