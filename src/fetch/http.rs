//! reqwest-backed fetch collaborator for static pages

use super::page::FetchedPage;
use super::render::{extract_links, extract_metadata, render_fallback_text, render_markdown};
use super::request::FetchRequest;
use super::{FetchError, PageFetcher};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client, Proxy};
use scraper::Html;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with the crawler's defaults
///
/// # Arguments
///
/// * `proxy` - Optional proxy URL applied to every scheme
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy or TLS backend failure
///
/// # Example
///
/// ```no_run
/// use pagesift::fetch::build_http_client;
///
/// let client = build_http_client(None).unwrap();
/// ```
pub fn build_http_client(proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(concat!("pagesift/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}

/// Default number of response bodies the cache holds before evicting
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct CachedBody {
    final_url: Url,
    body: String,
}

/// Fetches pages over plain HTTP and renders them without running scripts
///
/// Clients are built lazily per proxy. With `cache` set on a request, bodies
/// are reused by later requests for the same URL; the oldest entry is evicted
/// once the cache holds `capacity` bodies.
#[derive(Debug)]
pub struct HttpFetcher {
    clients: Mutex<HashMap<Option<String>, Client>>,
    cache: Mutex<ResponseCache>,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher whose cache holds at most `capacity` bodies
    ///
    /// A capacity of 0 disables caching regardless of the request policy.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            cache: Mutex::new(ResponseCache::new(capacity)),
        }
    }

    /// Number of bodies currently held in the response cache
    pub fn cached_pages(&self) -> usize {
        self.cache.lock().map(|cache| cache.entries.len()).unwrap_or(0)
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<Client, FetchError> {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = proxy.map(str::to_string);

        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let client =
            build_http_client(proxy).map_err(|e| FetchError::Unavailable(e.to_string()))?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    fn cached(&self, url: &Url) -> Option<CachedBody> {
        let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.entries.get(url.as_str()).cloned()
    }

    fn remember(&self, url: &Url, body: &CachedBody) {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.insert(url.to_string(), body.clone());
    }

    async fn download(&self, request: &FetchRequest) -> Result<CachedBody, FetchError> {
        let client = self.client_for(request.proxy.as_deref())?;

        let mut builder = client.get(request.url.clone()).timeout(request.timeout);
        if let Some(user_agent) = &request.user_agent {
            builder = builder.header(USER_AGENT, user_agent.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if !is_html_content_type(&content_type) {
            return Err(FetchError::NotHtml {
                url: request.url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        Ok(CachedBody { final_url, body })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn ensure_ready(&self) -> Result<(), FetchError> {
        self.client_for(None).map(|_| ())
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedPage, FetchError> {
        let body = match self.cached(&request.url).filter(|_| request.cache) {
            Some(body) => {
                tracing::trace!("Cache hit for {}", request.url);
                body
            }
            None => {
                let body = self.download(request).await?;
                if request.cache {
                    self.remember(&request.url, &body);
                }
                body
            }
        };

        Ok(build_page(&body, request))
    }
}

/// Insertion-ordered body cache with a fixed capacity
#[derive(Debug)]
struct ResponseCache {
    capacity: usize,
    entries: HashMap<String, CachedBody>,
    order: VecDeque<String>,
}

impl ResponseCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, key: String, body: CachedBody) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), body).is_some() {
            return;
        }

        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                tracing::trace!("Evicting cached body for {}", oldest);
                self.entries.remove(&oldest);
            }
        }
    }
}

/// Whether a response is markup the renderer can handle
///
/// A missing content type is accepted; anything else must name HTML or XHTML.
fn is_html_content_type(content_type: &str) -> bool {
    if content_type.is_empty() {
        return true;
    }

    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence == "text/html" || essence == "application/xhtml+xml"
}

fn build_page(body: &CachedBody, request: &FetchRequest) -> FetchedPage {
    let document = Html::parse_document(&body.body);

    FetchedPage {
        url: body.final_url.to_string(),
        success: true,
        markdown: render_markdown(&document, &body.final_url, request),
        html: body.body.clone(),
        fallback_text: Some(render_fallback_text(&document, &body.final_url)),
        links: extract_links(&document, &body.final_url),
        metadata: extract_metadata(&document),
        error_message: None,
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
