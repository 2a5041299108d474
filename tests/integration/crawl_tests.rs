//! End-to-end crawl runs

use crate::common::{fast_settings, FlakyOutput, ScriptedFetcher};
use pagesift::config::OutputLayout;
use pagesift::output::{FileOutput, SUMMARY_FILE};
use pagesift::{CrawlOrchestrator, CrawlPlan, HttpFetcher, RunReport};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    let html = format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    );
    ResponseTemplate::new(200).set_body_raw(html, "text/html")
}

fn explicit(urls: &[String]) -> CrawlPlan {
    CrawlPlan::Urls(urls.to_vec())
}

fn crawled(report: RunReport) -> pagesift::CrawlSummary {
    match report {
        RunReport::Crawled(summary) => summary,
        RunReport::Dry(_) => panic!("expected a crawl summary"),
    }
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Scheduler docs",
            r#"<nav><a href="/guide">Guide</a> <a href="/api">API</a></nav>
            <main><h1>Scheduler docs</h1>
            <p>These pages describe how the scheduler assigns queued jobs to workers and how to tune it.</p>
            <p>Start with the <a href="/guide">guide</a> or jump to the <a href="/api">API reference</a>.</p></main>
            <footer>Copyright 2024 Example Corp</footer>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(html_page(
            "Guide",
            r#"<nav><a href="/">Home</a></nav>
            <article><h1>Getting started with the scheduler</h1>
            <p>Install the scheduler, point it at a queue and start a worker pool sized for your machine.</p>
            <h2>Tuning the pool</h2>
            <p>Raise the worker count until throughput stops improving, then back off by one worker.</p></article>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(html_page(
            "API",
            r#"<article><h1>API reference for the scheduler</h1>
            <p>The submit call enqueues a job and returns its identifier, which can be polled for status.</p></article>"#,
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut settings = fast_settings();
    settings.crawler.max_depth = 1;

    let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, true));
    let orchestrator = CrawlOrchestrator::new(settings, Arc::new(HttpFetcher::new()), output);

    let plan = CrawlPlan::Discover {
        seeds: vec![format!("{}/", base)],
        include: Vec::new(),
        exclude: Vec::new(),
    };
    let summary = crawled(orchestrator.run(plan).await.unwrap());

    assert_eq!(summary.total, 3);
    assert_eq!(summary.successful, 3);
    assert_eq!(summary.failed, 0);

    let guide = summary
        .results
        .iter()
        .find(|r| r.url.ends_with("/guide"))
        .unwrap();
    assert!(guide.content.contains("Tuning the pool"));
    assert!(!guide.content.contains("Home"));

    let document = std::fs::read_to_string(guide.output_path.as_ref().unwrap()).unwrap();
    assert!(document.starts_with("---\n"));
    assert!(document.contains("capture_mode: enhanced"));
    assert!(document.contains("# Guide\n"));

    let root = summary
        .results
        .iter()
        .find(|r| r.url.ends_with('/'))
        .unwrap();
    assert!(!root.content.contains("Copyright"));

    let raw = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["successful"], 3);
    assert_eq!(json["discovery"]["urls"].as_array().unwrap().len(), 3);
    assert_eq!(json["settings_fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_server_error_is_recorded_not_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();

    for page in ["/a", "/b", "/c", "/d"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html_page(
                "Page",
                "<p>This page has a full sentence of content so that it passes the cleaner.</p>",
            ))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));
    let orchestrator =
        CrawlOrchestrator::new(fast_settings(), Arc::new(HttpFetcher::new()), output);

    let urls: Vec<String> = ["/a", "/b", "/broken", "/c", "/d"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    let summary = crawled(orchestrator.run(explicit(&urls)).await.unwrap());

    assert_eq!(summary.successful, 4);
    assert_eq!(summary.failed, 1);
    assert!(summary.failures[0].url.ends_with("/broken"));
    assert!(summary.failures[0].error.contains("500"));
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_latency(Duration::from_millis(25)));
    let dir = TempDir::new().unwrap();
    let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));

    let mut settings = fast_settings();
    settings.crawler.concurrency = 3;

    let urls: Vec<String> = (0..10).map(|i| format!("https://s.com/p{}", i)).collect();
    let summary = crawled(
        CrawlOrchestrator::new(settings, fetcher.clone(), output)
            .run(explicit(&urls))
            .await
            .unwrap(),
    );

    assert_eq!(summary.successful, 10);
    let peak = fetcher.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency was {}", peak);
    assert!(peak >= 1);
}

#[tokio::test]
async fn test_one_failure_among_five() {
    let fetcher = Arc::new(ScriptedFetcher::new().failing("https://s.com/3"));
    let dir = TempDir::new().unwrap();
    let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));

    let urls: Vec<String> = (1..=5).map(|i| format!("https://s.com/{}", i)).collect();
    let summary = crawled(
        CrawlOrchestrator::new(fast_settings(), fetcher, output)
            .run(explicit(&urls))
            .await
            .unwrap(),
    );

    assert_eq!(summary.successful, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.results.len(), 5);
}

#[tokio::test]
async fn test_query_variants_each_get_a_document() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_latency(Duration::from_millis(10)));
    let dir = TempDir::new().unwrap();
    let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));

    let urls = vec![
        "https://s.com/list?page=1".to_string(),
        "https://s.com/list?page=2".to_string(),
    ];
    let summary = crawled(
        CrawlOrchestrator::new(fast_settings(), fetcher, output)
            .run(explicit(&urls))
            .await
            .unwrap(),
    );

    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 0);

    let paths: Vec<_> = summary
        .results
        .iter()
        .map(|r| r.output_path.clone().unwrap())
        .collect();
    assert_ne!(paths[0], paths[1]);

    let documents = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".md"))
        .count();
    assert_eq!(documents, 2);
}

#[tokio::test]
async fn test_persistence_failure_is_recorded() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let dir = TempDir::new().unwrap();
    let inner = FileOutput::new(dir.path(), OutputLayout::Flat, false);
    let output = Arc::new(FlakyOutput::new(inner, "/locked"));

    let urls = vec![
        "https://s.com/open".to_string(),
        "https://s.com/locked".to_string(),
    ];
    let summary = crawled(
        CrawlOrchestrator::new(fast_settings(), fetcher, output)
            .run(explicit(&urls))
            .await
            .unwrap(),
    );

    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures[0].url, "https://s.com/locked");
    assert!(summary.failures[0].error.contains("read-only file"));
    assert!(dir.path().join("s.com_open.md").exists());
}

#[tokio::test]
async fn test_dry_run_fetches_no_content() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_links("https://s.com/", &["https://s.com/a", "https://s.com/b"])
            .with_links("https://s.com/a", &["https://s.com/a/deep"]),
    );
    let dir = TempDir::new().unwrap();
    let output = Arc::new(FileOutput::new(dir.path().join("out"), OutputLayout::Mirror, true));

    let report = CrawlOrchestrator::new(fast_settings(), fetcher.clone(), output)
        .dry_run(true)
        .run(CrawlPlan::Discover {
            seeds: vec!["https://s.com/".to_string()],
            include: Vec::new(),
            exclude: Vec::new(),
        })
        .await
        .unwrap();

    let RunReport::Dry(report) = report else {
        panic!("expected a dry-run report");
    };
    assert_eq!(report.total, 4);
    assert!(!report.preview_paths.is_empty());
    assert!(report.preview_paths[0].starts_with(dir.path().join("out")));
    assert_eq!(fetcher.captures.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_interrupt_stops_new_work() {
    let cancel = CancellationToken::new();
    let fetcher = Arc::new(ScriptedFetcher::new().cancel_on_call(2, cancel.clone()));
    let dir = TempDir::new().unwrap();
    let output = Arc::new(FileOutput::new(dir.path(), OutputLayout::Flat, false));

    let mut settings = fast_settings();
    settings.crawler.concurrency = 1;

    let urls: Vec<String> = (1..=5).map(|i| format!("https://s.com/{}", i)).collect();
    let summary = crawled(
        CrawlOrchestrator::new(settings, fetcher.clone(), output)
            .with_cancellation(cancel)
            .run(explicit(&urls))
            .await
            .unwrap(),
    );

    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.cancelled, 3);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    // the summary is still written for the partial run
    assert!(dir.path().join(SUMMARY_FILE).exists());
}
