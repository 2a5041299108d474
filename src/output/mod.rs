//! Output module for crawl documents and run reports
//!
//! This module handles:
//! - Rendering cleaned pages as markdown documents
//! - Mapping URLs to file paths (flat or mirrored layout)
//! - Writing the JSON run summary
//! - Printing console reports

mod file;
mod layout;
mod markdown;
pub mod stats;
mod traits;

pub use file::{FileOutput, SUMMARY_FILE};
pub use layout::{mirror_path, relative_path, url_to_filename};
pub use markdown::format_document;
pub use stats::{print_dry_run, print_summary, render_dry_run, render_summary};
pub use traits::{
    CrawlSummary, ExtractionResult, FailureRecord, OutputError, OutputHandler, OutputResult,
};
