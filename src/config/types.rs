use crate::clean::CleaningProfile;
use crate::extract::ExtractionMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Browser identities rotated across capture requests
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    // Chrome on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Firefox on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
    // Safari on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    // Edge on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Complete settings for one crawl run
///
/// Built from defaults, optionally overlaid by a TOML file and CLI overrides,
/// then frozen for the duration of the run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlSettings {
    pub crawler: CrawlerConfig,
    pub identity: IdentityConfig,
    pub extraction: ExtractionConfig,
    pub cleaning: CleaningConfig,
    pub output: OutputConfig,
}

/// Crawl budget and pacing configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum link depth followed from a seed URL
    pub max_depth: u32,

    /// Maximum number of URLs admitted by one discovery pass
    pub max_pages: usize,

    /// Follow links that leave the seed's site
    pub include_external: bool,

    /// Maximum number of capture fetches in flight
    pub concurrency: usize,

    /// Pause after each fetch, per worker slot (milliseconds)
    pub delay_ms: u64,

    /// Discovery fetch timeout (seconds)
    pub timeout_secs: u64,

    /// Allow the fetcher to serve cached responses
    pub cache: bool,

    /// Extra attempts after a failed fetch
    pub retry_attempts: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            include_external: false,
            concurrency: 3,
            delay_ms: 1000,
            timeout_secs: 30,
            cache: true,
            retry_attempts: 2,
        }
    }
}

impl CrawlerConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request identity configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdentityConfig {
    /// Pick a User-Agent uniformly at random per capture request
    pub rotate_user_agents: bool,

    /// Pool used when rotation is enabled
    pub user_agents: Vec<String>,

    /// Fixed User-Agent used when rotation is disabled
    pub user_agent: Option<String>,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,

    /// Proxy URL handed to the fetcher
    pub proxy: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            rotate_user_agents: true,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            user_agent: None,
            headers: BTreeMap::new(),
            proxy: None,
        }
    }
}

/// Selector-based extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    pub method: ExtractionMethod,

    /// Named selector template (blog, news, documentation, ecommerce, forum)
    pub template: Option<String>,

    /// CSS selectors for main content
    pub selectors: Vec<String>,

    /// Path queries for main content
    pub queries: Vec<String>,

    pub exclude_selectors: Vec<String>,

    pub exclude_queries: Vec<String>,
}

impl ExtractionConfig {
    /// Returns true if any content rule is configured, directly or via a template
    pub fn is_configured(&self) -> bool {
        self.template.is_some() || !self.selectors.is_empty() || !self.queries.is_empty()
    }
}

/// Line classifier configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CleaningConfig {
    pub profile: CleaningProfile,

    /// Overrides the profile's minimum content length
    pub min_content_length: Option<usize>,

    pub nav_patterns: Vec<String>,

    pub footer_patterns: Vec<String>,

    pub skip_patterns: Vec<String>,
}

/// How persisted documents are laid out on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// Every document in the output directory, named after host and path
    #[default]
    Flat,
    /// Directories mirror the site's host and path structure
    Mirror,
}

impl OutputLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Mirror => "mirror",
        }
    }
}

impl std::str::FromStr for OutputLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "mirror" => Ok(Self::Mirror),
            other => Err(format!("expected 'flat' or 'mirror', got '{}'", other)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub directory: PathBuf,

    pub layout: OutputLayout,

    /// Prefix each document with a front-matter metadata block
    pub include_metadata: bool,

    /// Number of projected paths shown by a dry run
    pub preview_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            layout: OutputLayout::Flat,
            include_metadata: true,
            preview_limit: 10,
        }
    }
}
