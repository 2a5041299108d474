//! Console reports for finished crawls and dry runs
//!
//! Reports are rendered to a `String` first so they can be tested, then
//! printed by the `print_*` wrappers.

use crate::crawler::DryRunReport;
use crate::output::CrawlSummary;
use std::fmt::Write;

/// Failures listed before the report truncates
const MAX_LISTED_FAILURES: usize = 20;

/// Renders a finished crawl for the terminal
pub fn render_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  URLs planned: {}", summary.total);
    let _ = writeln!(out, "  Successful: {}", summary.successful);
    let _ = writeln!(out, "  Failed: {}", summary.failed);
    if summary.cancelled > 0 {
        let _ = writeln!(out, "  Not attempted (interrupted): {}", summary.cancelled);
    }
    let _ = writeln!(out, "  Content extracted: {} chars", summary.total_content_length);
    if let Some(seconds) = summary.duration_seconds {
        let _ = writeln!(out, "  Duration: {:.1}s", seconds);
    }
    let _ = writeln!(out, "  Output directory: {}", summary.output_directory.display());
    let _ = writeln!(out);

    if let Some(discovery) = &summary.discovery {
        let _ = writeln!(out, "Discovery:");
        let _ = writeln!(out, "  Seeds: {}", discovery.seeds.join(", "));
        let _ = writeln!(out, "  Pages visited: {}", discovery.visited);
        let _ = writeln!(out, "  URLs admitted: {}", discovery.urls.len());
        let _ = writeln!(out, "  Link relationships: {}", discovery.relationship_count());
        if discovery.budget_exhausted {
            let _ = writeln!(
                out,
                "  Page budget reached ({} URLs left in frontier)",
                discovery.frontier_remaining
            );
        }
        let _ = writeln!(out);
    }

    if !summary.failures.is_empty() {
        let _ = writeln!(out, "Failures ({}):", summary.failures.len());
        for failure in summary.failures.iter().take(MAX_LISTED_FAILURES) {
            let _ = writeln!(out, "  - {}: {}", failure.url, failure.error);
        }
        if summary.failures.len() > MAX_LISTED_FAILURES {
            let _ = writeln!(
                out,
                "  ... and {} more",
                summary.failures.len() - MAX_LISTED_FAILURES
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} pages saved)",
        summary.success_rate(),
        summary.successful,
        summary.completed()
    );

    out
}

/// Renders the would-be crawl of a dry run
pub fn render_dry_run(report: &DryRunReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== pagesift Dry Run ===\n");
    let _ = writeln!(out, "URLs to crawl: {}", report.total);

    if let Some(discovery) = &report.discovery {
        let _ = writeln!(out, "Seeds: {}", discovery.seeds.join(", "));
        let _ = writeln!(out, "Pages visited: {}", discovery.visited);
        let _ = writeln!(out, "Link relationships: {}", discovery.relationship_count());
        if discovery.budget_exhausted {
            let _ = writeln!(out, "Page budget reached");
        }
    }
    let _ = writeln!(out);

    let shown = report.preview_paths.len();
    if shown > 0 {
        let _ = writeln!(out, "Preview (first {}):", shown);
        for (url, path) in report.urls.iter().zip(&report.preview_paths) {
            let _ = writeln!(out, "  {} -> {}", url, path.display());
        }
        if report.total > shown {
            let _ = writeln!(out, "  ... and {} more", report.total - shown);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "No content was fetched or written");
    out
}

pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", render_summary(summary));
}

pub fn print_dry_run(report: &DryRunReport) {
    print!("{}", render_dry_run(report));
}
