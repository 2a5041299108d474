//! Bounded concurrent fetch → extract → persist over a fixed URL list

use super::discovery::{pause, DiscoveryOutcome};
use crate::clean::{apply_length_fallback, extract_and_clean, CleanerConfig, ContentCleaner};
use crate::config::{settings_fingerprint, CrawlSettings};
use crate::extract::SelectorExtractor;
use crate::fetch::{FetchError, FetchRequest, FetchedPage, PageFetcher};
use crate::output::{CrawlSummary, ExtractionResult, OutputHandler};
use crate::url::normalize_url;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Fetches, cleans and persists pages with at most `concurrency` in flight
///
/// Each URL is handled start to finish by one task: capture fetch (with
/// retries), selector extraction and line cleaning, then an immediate write.
/// The task keeps its slot through the pacing delay, so N slots with delay D
/// sustain roughly N/D requests. Results flow over a channel to a single
/// aggregator; a failing URL is recorded and never stops the batch.
#[derive(Clone)]
pub struct ContentCrawler {
    fetcher: Arc<dyn PageFetcher>,
    output: Arc<dyn OutputHandler>,
    settings: Arc<CrawlSettings>,
    extractor: Arc<SelectorExtractor>,
    cleaner: Arc<ContentCleaner>,
    cancel: CancellationToken,
}

impl ContentCrawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        output: Arc<dyn OutputHandler>,
        settings: Arc<CrawlSettings>,
        cancel: CancellationToken,
    ) -> Self {
        let extractor = SelectorExtractor::from_config(&settings.extraction);
        let cleaner = ContentCleaner::new(CleanerConfig::from_settings(&settings.cleaning));

        Self {
            fetcher,
            output,
            settings,
            extractor: Arc::new(extractor),
            cleaner: Arc::new(cleaner),
            cancel,
        }
    }

    /// Crawls an explicit URL list and writes the run summary
    pub async fn crawl(&self, urls: &[String]) -> CrawlSummary {
        self.run(urls, None).await
    }

    /// Crawls the URLs admitted by discovery, keeping the discovery report
    pub async fn crawl_discovered(&self, outcome: DiscoveryOutcome) -> CrawlSummary {
        let urls = outcome.urls.clone();
        self.run(&urls, Some(outcome)).await
    }

    async fn run(&self, urls: &[String], discovery: Option<DiscoveryOutcome>) -> CrawlSummary {
        let total = urls.len();
        let concurrency = self.settings.crawler.concurrency.max(1);
        let delay = self.settings.crawler.delay();

        tracing::info!(
            "Crawling {} URLs with concurrency {} and {:?} delay",
            total,
            concurrency,
            delay
        );

        let mut summary = CrawlSummary::new(
            total,
            self.output.directory().to_path_buf(),
            settings_fingerprint(&self.settings),
        );
        summary.discovery = discovery;

        let (tx, mut rx) = mpsc::channel::<ExtractionResult>(concurrency * 2);
        let aggregator = tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                match result.error() {
                    None => tracing::info!("Saved {}", result.url),
                    Some(error) => tracing::warn!("Failed {}: {}", result.url, error),
                }
                summary.record(result);

                let done = summary.completed();
                if done % 10 == 0 {
                    tracing::info!(
                        "Progress: {}/{} pages, {} failed",
                        done,
                        summary.total,
                        summary.failed
                    );
                }
            }
            summary
        });

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();

        for url in urls {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::info!("Interrupted, not starting remaining URLs");
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let worker = self.clone();
            let tx = tx.clone();
            let url = url.clone();

            tasks.spawn(async move {
                let result = worker.process(&url).await;
                if tx.send(result).await.is_err() {
                    tracing::error!("Result aggregator closed before {} was recorded", url);
                }
                pause(&worker.cancel, delay).await;
                drop(permit);
            });
        }

        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Crawl task failed: {}", e);
            }
        }

        let mut summary = match aggregator.await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Result aggregator failed: {}", e);
                CrawlSummary::new(
                    total,
                    self.output.directory().to_path_buf(),
                    settings_fingerprint(&self.settings),
                )
            }
        };
        summary.finish();

        match self.output.write_summary(&summary).await {
            Ok(path) => tracing::info!("Summary written to {}", path.display()),
            Err(e) => tracing::error!("Failed to write crawl summary: {}", e),
        }

        tracing::info!(
            "Crawl finished: {} succeeded, {} failed, {} not attempted",
            summary.successful,
            summary.failed,
            summary.cancelled
        );

        summary
    }

    /// Handles one URL: fetch, extract, persist
    async fn process(&self, url: &str) -> ExtractionResult {
        let target = match normalize_url(url, None) {
            Ok(target) => target,
            Err(e) => return ExtractionResult::failed(url, e.to_string()),
        };

        let request = FetchRequest::capture(target, &self.settings, self.pick_user_agent());
        let page = match self.fetch_with_retry(&request).await {
            Ok(page) => page,
            Err(e) => return ExtractionResult::failed(url, e.to_string()),
        };

        let mut result = self.extract(url, &page);

        match self.output.persist(&result).await {
            Ok(path) => result.output_path = Some(path),
            Err(e) => {
                tracing::error!("Could not persist {}: {}", url, e);
                result.mark_failed(format!("Persistence failed: {}", e));
            }
        }

        result
    }

    fn extract(&self, url: &str, page: &FetchedPage) -> ExtractionResult {
        let title = page.title().unwrap_or_default();

        let cleaned = extract_and_clean(
            &self.extractor,
            &self.cleaner,
            &page.html,
            &page.markdown,
            title,
        );
        let cleaned =
            apply_length_fallback(cleaned, &self.cleaner, page.fallback_text.as_deref(), title);

        if cleaned.len() < self.cleaner.min_content_length() {
            tracing::warn!(
                "Content seems short for {} ({} chars)",
                url,
                cleaned.len()
            );
        }

        ExtractionResult::succeeded(
            url,
            if title.is_empty() { "Untitled" } else { title },
            page.description().unwrap_or_default(),
            cleaned.text,
            cleaned.source,
            page.markdown.chars().count(),
            page.links.len(),
        )
    }

    /// Fetches with up to `retry_attempts` extra tries and linear backoff
    async fn fetch_with_retry(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let retries = self.settings.crawler.retry_attempts;
        let mut attempt = 0;

        loop {
            let error = match self.fetcher.fetch(request).await {
                Ok(page) if page.success => return Ok(page),
                Ok(page) => FetchError::Reported(
                    page.error_message
                        .unwrap_or_else(|| "fetch reported failure".to_string()),
                ),
                Err(e) => e,
            };

            if attempt >= retries || !error.is_retryable() || self.cancel.is_cancelled() {
                return Err(error);
            }

            attempt += 1;
            let backoff = self.settings.crawler.delay() * attempt;
            tracing::debug!(
                "Retrying {} in {:?} (attempt {}/{}): {}",
                request.url,
                backoff,
                attempt,
                retries,
                error
            );

            if !pause(&self.cancel, backoff).await {
                return Err(error);
            }
        }
    }

    /// Chooses the User-Agent for one capture request
    fn pick_user_agent(&self) -> Option<String> {
        let identity = &self.settings.identity;
        if identity.rotate_user_agents {
            identity.user_agents.choose(&mut rand::rng()).cloned()
        } else {
            identity.user_agent.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::NO_CONTENT_PLACEHOLDER;
    use crate::config::OutputLayout;
    use crate::fetch::{PageLinks, PageMetadata};
    use crate::output::FileOutput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves the same page for every URL, failing URLs containing "fail"
    struct StaticFetcher {
        markdown: String,
        calls: AtomicUsize,
        user_agents: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl StaticFetcher {
        fn new(markdown: &str) -> Self {
            Self {
                markdown: markdown.to_string(),
                calls: AtomicUsize::new(0),
                user_agents: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.user_agents
                .lock()
                .unwrap()
                .push(request.user_agent.clone());

            if request.url.path().contains("fail") {
                return Ok(FetchedPage::failed(request.url.as_str(), "simulated outage"));
            }

            Ok(FetchedPage {
                url: request.url.to_string(),
                success: true,
                markdown: self.markdown.clone(),
                links: PageLinks {
                    internal: vec!["https://s.com/next".to_string()],
                    external: Vec::new(),
                },
                metadata: PageMetadata {
                    title: Some("Worker pools".to_string()),
                    description: Some("Sizing worker pools".to_string()),
                },
                ..Default::default()
            })
        }
    }

    const ARTICLE: &str = "Skip to content\n# Worker pools\nA worker pool bounds how many jobs run at once so that a burst of submissions cannot exhaust memory or file handles on the host.";

    fn settings(retries: u32) -> Arc<CrawlSettings> {
        let mut settings = CrawlSettings::default();
        settings.crawler.delay_ms = 0;
        settings.crawler.retry_attempts = retries;
        Arc::new(settings)
    }

    fn crawler(
        fetcher: Arc<StaticFetcher>,
        dir: &TempDir,
        settings: Arc<CrawlSettings>,
    ) -> ContentCrawler {
        let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));
        ContentCrawler::new(fetcher, output, settings, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_crawl_cleans_and_persists() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::new(ARTICLE));
        let summary = crawler(fetcher, &dir, settings(0))
            .crawl(&["https://s.com/pools".to_string()])
            .await;

        assert_eq!(summary.successful, 1);
        let result = &summary.results[0];
        assert_eq!(result.title, "Worker pools");
        assert_eq!(result.link_count, 1);
        assert!(!result.content.contains("Skip to content"));

        let written = std::fs::read_to_string(dir.path().join("s.com_pools.md")).unwrap();
        assert!(written.starts_with("# Worker pools\n"));
        assert!(written.contains("A worker pool bounds"));
        assert!(!written.contains("Skip to content"));
        assert!(dir.path().join("crawl_summary.json").exists());
    }

    #[tokio::test]
    async fn test_failures_are_recorded_after_retries() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::new(ARTICLE));
        let urls = vec![
            "https://s.com/one".to_string(),
            "https://s.com/fail".to_string(),
        ];
        let summary = crawler(fetcher.clone(), &dir, settings(2)).crawl(&urls).await;

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].url, "https://s.com/fail");
        assert!(summary.failures[0].error.contains("simulated outage"));
        // one call for the good page, three for the failing one
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_page_gets_placeholder() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::new("Menu\nSearch"));
        let summary = crawler(fetcher, &dir, settings(0))
            .crawl(&["https://s.com/empty".to_string()])
            .await;

        assert_eq!(summary.successful, 1);
        assert_eq!(summary.results[0].content, NO_CONTENT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_fixed_user_agent_when_rotation_disabled() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::new(ARTICLE));
        let mut custom = (*settings(0)).clone();
        custom.identity.rotate_user_agents = false;
        custom.identity.user_agent = Some("DocsBot/2.0".to_string());

        crawler(fetcher.clone(), &dir, Arc::new(custom))
            .crawl(&["https://s.com/a".to_string()])
            .await;

        assert_eq!(
            fetcher.user_agents.lock().unwrap().as_slice(),
            &[Some("DocsBot/2.0".to_string())]
        );
    }

    #[tokio::test]
    async fn test_rotated_user_agent_comes_from_pool() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::new(ARTICLE));
        let urls: Vec<String> = (0..5).map(|i| format!("https://s.com/p{}", i)).collect();

        crawler(fetcher.clone(), &dir, settings(0)).crawl(&urls).await;

        let pool = CrawlSettings::default().identity.user_agents;
        for agent in fetcher.user_agents.lock().unwrap().iter() {
            assert!(pool.contains(agent.as_ref().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_attempts_nothing() {
        let dir = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticFetcher::new(ARTICLE));
        let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = ContentCrawler::new(fetcher.clone(), output, settings(0), cancel)
            .crawl(&["https://s.com/a".to_string(), "https://s.com/b".to_string()])
            .await;

        assert_eq!(summary.cancelled, 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }
}
