//! Integration tests for pagesift
//!
//! The HTTP fetcher is exercised against wiremock servers; concurrency,
//! failure and dry-run properties use scripted in-memory fetchers.

mod common;
mod crawl_tests;
mod discovery_tests;
mod fetch_tests;
