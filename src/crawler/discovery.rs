//! Breadth-first URL discovery
//!
//! The walker keeps a FIFO frontier seeded with one URL at depth 0. Each
//! dequeued URL is fetched once through the fetch collaborator; pages that
//! load are admitted if the pattern matcher accepts them, and their links are
//! enqueued one level deeper while the depth limit allows. The walk is
//! strictly sequential and paced between dequeues.

use crate::config::CrawlSettings;
use crate::fetch::{FetchRequest, FetchedPage, PageFetcher};
use crate::url::{normalize_url, same_site, PatternMatcher};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress of a discovery walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryState {
    NotStarted,
    Visiting,
    Done,
}

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
    pub parent: Option<Url>,
}

/// Result of one or more discovery passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    pub seeds: Vec<String>,

    /// Admitted URLs, sorted
    pub urls: Vec<String>,

    /// Parent URL → children first enqueued from it
    pub relationships: BTreeMap<String, Vec<String>>,

    /// Pages fetched during the walk
    pub visited: usize,

    pub fetch_failures: usize,

    /// Entries still queued when the walk stopped
    pub frontier_remaining: usize,

    /// The page budget stopped the walk
    pub budget_exhausted: bool,

    pub cancelled: bool,
}

impl DiscoveryOutcome {
    /// Unions another pass into this one
    pub fn merge(&mut self, other: DiscoveryOutcome) {
        self.seeds.extend(other.seeds);

        let urls: BTreeSet<String> = self.urls.drain(..).chain(other.urls).collect();
        self.urls = urls.into_iter().collect();

        for (parent, children) in other.relationships {
            let entry = self.relationships.entry(parent).or_default();
            for child in children {
                if !entry.contains(&child) {
                    entry.push(child);
                }
            }
        }

        self.visited += other.visited;
        self.fetch_failures += other.fetch_failures;
        self.frontier_remaining += other.frontier_remaining;
        self.budget_exhausted |= other.budget_exhausted;
        self.cancelled |= other.cancelled;
    }

    /// Number of parent → child edges recorded
    pub fn relationship_count(&self) -> usize {
        self.relationships.values().map(Vec::len).sum()
    }
}

/// Sequential frontier walker
pub struct UrlDiscovery {
    fetcher: Arc<dyn PageFetcher>,
    settings: Arc<CrawlSettings>,
    cancel: CancellationToken,
    state: DiscoveryState,
}

impl UrlDiscovery {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        settings: Arc<CrawlSettings>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            settings,
            cancel,
            state: DiscoveryState::NotStarted,
        }
    }

    pub fn state(&self) -> DiscoveryState {
        self.state
    }

    /// Walks the site reachable from `seed`
    ///
    /// # Arguments
    ///
    /// * `seed` - Starting URL, enqueued at depth 0
    /// * `matcher` - Decides which fetched URLs are admitted
    ///
    /// # Returns
    ///
    /// The admitted URLs (sorted) with the parent → children map. Fetch
    /// failures never abort the walk; they are counted and the URL is
    /// treated as having no links.
    pub async fn discover(&mut self, seed: &Url, matcher: &PatternMatcher) -> DiscoveryOutcome {
        let crawler = &self.settings.crawler;
        let max_depth = crawler.max_depth;
        let max_pages = crawler.max_pages;
        let delay = crawler.delay();

        let seed = normalize_url(seed.as_str(), None).unwrap_or_else(|_| seed.clone());

        let mut frontier = Frontier::new(seed.clone());
        let mut discovered: BTreeSet<String> = BTreeSet::new();
        let mut outcome = DiscoveryOutcome {
            seeds: vec![seed.to_string()],
            ..Default::default()
        };

        self.state = DiscoveryState::Visiting;
        tracing::info!(
            "Discovering from {} (max depth {}, max pages {})",
            seed,
            max_depth,
            max_pages
        );

        while discovered.len() < max_pages {
            if self.cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let Some(entry) = frontier.next() else {
                break;
            };

            if entry.depth > max_depth || !frontier.mark_visited(&entry.url) {
                continue;
            }

            tracing::debug!("Visiting {} (depth {})", entry.url, entry.depth);
            outcome.visited += 1;

            match self.fetch(&entry.url).await {
                Some(page) => {
                    let key = entry.url.to_string();
                    if matcher.admits(&key) {
                        discovered.insert(key);
                    } else {
                        tracing::trace!("Not admitted: {}", entry.url);
                    }

                    if entry.depth < max_depth {
                        let added =
                            frontier.enqueue_links(&entry, &page, &seed, crawler.include_external);
                        tracing::trace!("Queued {} new links from {}", added, entry.url);
                    }
                }
                None => outcome.fetch_failures += 1,
            }

            if outcome.visited % 10 == 0 {
                tracing::info!(
                    "Discovery progress: {} visited, {} admitted, {} queued",
                    outcome.visited,
                    discovered.len(),
                    frontier.len()
                );
            }

            if frontier.is_empty() || discovered.len() >= max_pages {
                continue;
            }

            if !pause(&self.cancel, delay).await {
                outcome.cancelled = true;
                break;
            }
        }

        outcome.budget_exhausted = discovered.len() >= max_pages && !frontier.is_empty();
        outcome.frontier_remaining = frontier.len();
        outcome.urls = discovered.into_iter().collect();
        outcome.relationships = frontier.relationships;
        self.state = DiscoveryState::Done;

        if outcome.budget_exhausted {
            tracing::info!(
                "Page budget of {} reached with {} URLs still queued",
                max_pages,
                outcome.frontier_remaining
            );
        }
        tracing::info!(
            "Discovery from {} finished: {} admitted, {} visited, {} failed",
            seed,
            outcome.urls.len(),
            outcome.visited,
            outcome.fetch_failures
        );

        outcome
    }

    async fn fetch(&self, url: &Url) -> Option<FetchedPage> {
        let request = FetchRequest::discovery(url.clone(), &self.settings);

        match self.fetcher.fetch(&request).await {
            Ok(page) if page.success => Some(page),
            Ok(page) => {
                tracing::warn!(
                    "Discovery fetch of {} failed: {}",
                    url,
                    page.error_message.as_deref().unwrap_or("unknown error")
                );
                None
            }
            Err(e) => {
                tracing::warn!("Discovery fetch of {} failed: {}", url, e);
                None
            }
        }
    }
}

/// FIFO queue with visited and queued membership sets
struct Frontier {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    relationships: BTreeMap<String, Vec<String>>,
}

impl Frontier {
    fn new(seed: Url) -> Self {
        let mut queued = HashSet::new();
        queued.insert(seed.to_string());

        Self {
            queue: VecDeque::from([FrontierEntry {
                url: seed,
                depth: 0,
                parent: None,
            }]),
            queued,
            visited: HashSet::new(),
            relationships: BTreeMap::new(),
        }
    }

    fn next(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Returns false if the URL was already visited
    fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.to_string())
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Enqueues the page's unseen links one level below `entry`
    fn enqueue_links(
        &mut self,
        entry: &FrontierEntry,
        page: &FetchedPage,
        seed: &Url,
        include_external: bool,
    ) -> usize {
        let mut added = 0;

        for link in page.links.all() {
            let url = match normalize_url(link, Some(&entry.url)) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("Skipping link {}: {}", link, e);
                    continue;
                }
            };

            if !include_external && !same_site(&url, seed) {
                continue;
            }

            let key = url.to_string();
            if self.visited.contains(&key) || self.queued.contains(&key) {
                continue;
            }

            self.queued.insert(key.clone());
            self.relationships
                .entry(entry.url.to_string())
                .or_default()
                .push(key);
            self.queue.push_back(FrontierEntry {
                url,
                depth: entry.depth + 1,
                parent: Some(entry.url.clone()),
            });
            added += 1;
        }

        added
    }
}

/// Sleeps for `delay` unless cancelled first; returns false on cancellation
pub(crate) async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
