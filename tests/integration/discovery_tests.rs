//! Breadth-first discovery over a mock site

use crate::common::{fast_settings, ScriptedFetcher};
use pagesift::config::CrawlSettings;
use pagesift::crawler::UrlDiscovery;
use pagesift::url::PatternMatcher;
use pagesift::HttpFetcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn link_page(server: &MockServer, at: &str, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();

    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(format!("<html><body>{}</body></html>", anchors), "text/html"),
        )
        .mount(server)
        .await;
}

fn discovery(settings: CrawlSettings) -> UrlDiscovery {
    UrlDiscovery::new(
        Arc::new(HttpFetcher::new()),
        Arc::new(settings),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_depth_limit_stops_descent() {
    let server = MockServer::start().await;
    link_page(&server, "/", &["/l1"]).await;
    link_page(&server, "/l1", &["/l2"]).await;
    link_page(&server, "/l2", &["/l3"]).await;
    Mock::given(method("GET"))
        .and(path("/l3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut settings = fast_settings();
    settings.crawler.max_depth = 2;

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let outcome = discovery(settings)
        .discover(&seed, &PatternMatcher::admit_all())
        .await;

    let base = server.uri();
    assert_eq!(
        outcome.urls,
        vec![format!("{}/", base), format!("{}/l1", base), format!("{}/l2", base)]
    );
    assert_eq!(outcome.visited, 3);
}

#[tokio::test]
async fn test_patterns_filter_admission_not_traversal() {
    let server = MockServer::start().await;
    link_page(&server, "/", &["/docs/intro", "/blog/news"]).await;
    link_page(&server, "/docs/intro", &["/docs/setup"]).await;
    link_page(&server, "/blog/news", &["/docs/faq"]).await;
    link_page(&server, "/docs/setup", &[]).await;
    link_page(&server, "/docs/faq", &[]).await;

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let matcher = PatternMatcher::new(&["*/docs/*"], &["*/docs/faq"]);
    let outcome = discovery(fast_settings()).discover(&seed, &matcher).await;

    let base = server.uri();
    assert_eq!(
        outcome.urls,
        vec![format!("{}/docs/intro", base), format!("{}/docs/setup", base)]
    );
    // the non-admitted blog page was still walked
    assert_eq!(outcome.visited, 5);
}

#[tokio::test]
async fn test_other_sites_are_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let foreign = format!("{}/elsewhere", other.uri());

    link_page(&server, "/", &["/local", foreign.as_str()]).await;
    link_page(&server, "/local", &[]).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&other)
        .await;

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let outcome = discovery(fast_settings())
        .discover(&seed, &PatternMatcher::admit_all())
        .await;

    assert_eq!(outcome.urls.len(), 2);
    assert!(!outcome.urls.contains(&foreign));
}

#[tokio::test]
async fn test_unreachable_pages_are_counted() {
    let server = MockServer::start().await;
    link_page(&server, "/", &["/gone", "/here"]).await;
    link_page(&server, "/here", &[]).await;

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let outcome = discovery(fast_settings())
        .discover(&seed, &PatternMatcher::admit_all())
        .await;

    assert_eq!(outcome.urls.len(), 2);
    assert_eq!(outcome.fetch_failures, 1);
}

#[tokio::test]
async fn test_budget_bounds_result_and_is_deterministic() {
    let build = || {
        ScriptedFetcher::new()
            .with_links(
                "https://s.com/",
                &["https://s.com/a", "https://s.com/b", "https://s.com/c"],
            )
            .with_links("https://s.com/a", &["https://s.com/a/1", "https://s.com/a/2"])
    };

    let mut settings = fast_settings();
    settings.crawler.max_pages = 3;
    let settings = Arc::new(settings);
    let seed = Url::parse("https://s.com/").unwrap();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut walker =
            UrlDiscovery::new(Arc::new(build()), settings.clone(), CancellationToken::new());
        runs.push(walker.discover(&seed, &PatternMatcher::admit_all()).await);
    }

    assert_eq!(runs[0].urls.len(), 3);
    assert!(runs[0].budget_exhausted);
    assert_eq!(runs[0], runs[1]);
    assert_eq!(
        runs[0].urls,
        vec!["https://s.com/", "https://s.com/a", "https://s.com/b"]
    );
}
