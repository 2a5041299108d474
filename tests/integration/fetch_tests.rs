//! HttpFetcher against a mock server

use pagesift::config::CrawlSettings;
use pagesift::fetch::{FetchError, FetchRequest, HttpFetcher, PageFetcher};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"<html>
<head>
  <title>Queue internals</title>
  <meta name="description" content="How jobs move through the queue">
</head>
<body>
  <nav><a href="/">Home</a> <a href="/blog">Blog</a></nav>
  <div class="cookie-banner">We use cookies</div>
  <main>
    <h1>Queue internals</h1>
    <p>Jobs enter the queue in submission order and leave it when a worker claims them.</p>
    <ul><li>claimed jobs are leased</li><li>expired leases return to the queue</li></ul>
    <p>See <a href="/workers">workers</a> and <a href="https://elsewhere.org/paper">the paper</a>.</p>
  </main>
  <footer>Copyright 2024</footer>
</body>
</html>"#;

async fn serve_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .mount(server)
        .await;
}

fn page_url(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).unwrap()
}

#[tokio::test]
async fn test_capture_renders_content_without_chrome() {
    let server = MockServer::start().await;
    serve_page(&server).await;

    let request =
        FetchRequest::capture(page_url(&server, "/queue"), &CrawlSettings::default(), None);
    let page = HttpFetcher::new().fetch(&request).await.unwrap();

    assert!(page.success);
    assert_eq!(page.title(), Some("Queue internals"));
    assert_eq!(page.description(), Some("How jobs move through the queue"));

    assert!(page.markdown.contains("# Queue internals"));
    assert!(page.markdown.contains("- claimed jobs are leased"));
    assert!(!page.markdown.contains("Blog"));
    assert!(!page.markdown.contains("Copyright"));
    assert!(!page.markdown.contains("We use cookies"));

    // the rawer capture keeps the chrome
    let fallback = page.fallback_text.as_deref().unwrap();
    assert!(fallback.contains("Copyright 2024"));
    assert!(fallback.contains("Jobs enter the queue"));
}

#[tokio::test]
async fn test_links_are_split_by_site() {
    let server = MockServer::start().await;
    serve_page(&server).await;

    let request = FetchRequest::discovery(page_url(&server, "/queue"), &CrawlSettings::default());
    let page = HttpFetcher::new().fetch(&request).await.unwrap();

    let workers = format!("{}/workers", server.uri());
    assert!(page.links.internal.contains(&workers));
    assert!(page.links.internal.contains(&format!("{}/blog", server.uri())));
    assert_eq!(page.links.external, vec!["https://elsewhere.org/paper"]);
}

#[tokio::test]
async fn test_not_found_is_not_retryable() {
    let server = MockServer::start().await;

    let request = FetchRequest::discovery(page_url(&server, "/missing"), &CrawlSettings::default());
    let error = HttpFetcher::new().fetch(&request).await.unwrap_err();

    assert!(matches!(error, FetchError::Status { status: 404, .. }));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_service_unavailable_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let request = FetchRequest::discovery(page_url(&server, "/busy"), &CrawlSettings::default());
    let error = HttpFetcher::new().fetch(&request).await.unwrap_err();

    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_non_html_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let request =
        FetchRequest::discovery(page_url(&server, "/data.json"), &CrawlSettings::default());
    let error = HttpFetcher::new().fetch(&request).await.unwrap_err();

    assert!(matches!(error, FetchError::NotHtml { .. }));
}

#[tokio::test]
async fn test_cache_serves_repeat_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new();
    let request = FetchRequest::discovery(page_url(&server, "/queue"), &CrawlSettings::default());

    let first = fetcher.fetch(&request).await.unwrap();
    let second = fetcher.fetch(&request).await.unwrap();

    assert_eq!(first.markdown, second.markdown);
    assert_eq!(fetcher.cached_pages(), 1);
}

#[tokio::test]
async fn test_cache_disabled_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = CrawlSettings::default();
    settings.crawler.cache = false;

    let fetcher = HttpFetcher::new();
    let request = FetchRequest::discovery(page_url(&server, "/queue"), &settings);
    fetcher.fetch(&request).await.unwrap();
    fetcher.fetch(&request).await.unwrap();

    assert_eq!(fetcher.cached_pages(), 0);
}

#[tokio::test]
async fn test_identity_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/queue"))
        .and(header("user-agent", "DocsBot/2.0"))
        .and(header("accept-language", "en-GB"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"))
        .mount(&server)
        .await;

    let mut settings = CrawlSettings::default();
    settings
        .identity
        .headers
        .insert("Accept-Language".to_string(), "en-GB".to_string());

    let request = FetchRequest::capture(
        page_url(&server, "/queue"),
        &settings,
        Some("DocsBot/2.0".to_string()),
    );
    let page = HttpFetcher::new().fetch(&request).await.unwrap();

    assert!(page.success);
}
