//! Request shapes handed to the fetch collaborator

use crate::config::CrawlSettings;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Timeout used for content capture, independent of the discovery timeout
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(45);

/// Word-count floor for content blocks during capture
pub const CAPTURE_WORD_THRESHOLD: usize = 50;

/// Tags a capture asks the collaborator to drop before rendering
pub const CAPTURE_EXCLUDED_TAGS: &[&str] = &["nav", "footer", "header", "aside"];

/// Script injected by browser-backed fetchers before a capture is taken
///
/// Scrolls until the page height is stable for five consecutive attempts,
/// clicks the first "load more" style control, then scrolls back to the top.
pub const CAPTURE_SCRIPT: &str = r##"
const settle = (ms) => new Promise((resolve) => setTimeout(resolve, ms));

let height = document.body.scrollHeight;
let stable = 0;
while (stable < 5) {
    window.scrollTo(0, document.body.scrollHeight);
    await settle(1000);
    const next = document.body.scrollHeight;
    if (next > height) {
        height = next;
        stable = 0;
    } else {
        stable += 1;
    }
}

const phrases = ['load more', 'show more', 'view more', 'read more', 'see more', 'expand'];
const candidates = document.querySelectorAll(
    'button, a[href="#"], .load-more, .show-more, .view-more, [class*="load"], [class*="more"]'
);
for (const control of candidates) {
    const text = (control.textContent || '').toLowerCase();
    const label = (control.getAttribute('aria-label') || '').toLowerCase();
    if (phrases.some((p) => text.includes(p)) || label.includes('load') || label.includes('more')) {
        try {
            control.click();
            await settle(2000);
            break;
        } catch (_) {}
    }
}

window.scrollTo(0, 0);
await settle(500);
"##;

/// When the collaborator considers a page loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    DomContentLoaded,
    Load,
    NetworkIdle,
}

/// Options for the markdown-like body rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub keep_links: bool,
    pub keep_images: bool,
    /// Wrap paragraphs at this many characters; 0 (the default) disables wrapping
    pub body_width: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            keep_links: true,
            keep_images: true,
            body_width: 0,
        }
    }
}

/// One fetch as requested by discovery or capture
///
/// Browser-only policies (script, iframes, overlays, word threshold) are part
/// of the request so a browser-backed collaborator can honour them; the
/// built-in [`HttpFetcher`](crate::fetch::HttpFetcher) applies the subset that
/// makes sense for static markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: Url,
    pub cache: bool,
    pub wait_until: WaitPolicy,
    pub timeout: Duration,
    pub script: Option<String>,
    pub user_agent: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub proxy: Option<String>,
    pub process_iframes: bool,
    pub remove_overlays: bool,
    pub word_count_threshold: usize,
    pub excluded_tags: Vec<String>,
    pub markdown: MarkdownOptions,
}

impl FetchRequest {
    /// Builds the lightweight request used while walking the frontier
    pub fn discovery(url: Url, settings: &CrawlSettings) -> Self {
        Self {
            url,
            cache: settings.crawler.cache,
            wait_until: WaitPolicy::NetworkIdle,
            timeout: settings.crawler.timeout(),
            script: None,
            user_agent: settings.identity.user_agent.clone(),
            headers: settings.identity.headers.clone(),
            proxy: settings.identity.proxy.clone(),
            process_iframes: false,
            remove_overlays: false,
            word_count_threshold: 0,
            excluded_tags: Vec::new(),
            markdown: MarkdownOptions::default(),
        }
    }

    /// Builds the extended request used to capture page content
    ///
    /// # Arguments
    ///
    /// * `url` - Page to capture
    /// * `settings` - Run settings (cache, headers, proxy)
    /// * `user_agent` - Identity chosen for this request
    pub fn capture(url: Url, settings: &CrawlSettings, user_agent: Option<String>) -> Self {
        Self {
            url,
            cache: settings.crawler.cache,
            wait_until: WaitPolicy::NetworkIdle,
            timeout: CAPTURE_TIMEOUT,
            script: Some(CAPTURE_SCRIPT.to_string()),
            user_agent,
            headers: settings.identity.headers.clone(),
            proxy: settings.identity.proxy.clone(),
            process_iframes: true,
            remove_overlays: true,
            word_count_threshold: CAPTURE_WORD_THRESHOLD,
            excluded_tags: CAPTURE_EXCLUDED_TAGS.iter().map(|t| t.to_string()).collect(),
            markdown: MarkdownOptions::default(),
        }
    }

    pub fn is_capture(&self) -> bool {
        self.script.is_some()
    }
}
