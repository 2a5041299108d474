//! Crawler module: URL discovery and concurrent content capture
//!
//! This module contains:
//! - Breadth-first discovery under depth and page budgets
//! - Bounded concurrent fetch, extraction and persistence
//! - Run orchestration, including dry runs

mod content;
mod discovery;
mod orchestrator;

pub use content::ContentCrawler;
pub use discovery::{DiscoveryOutcome, DiscoveryState, FrontierEntry, UrlDiscovery};
pub use orchestrator::{CrawlOrchestrator, CrawlPlan, DryRunReport, RunReport};
