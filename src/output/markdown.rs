//! Document rendering
//!
//! Each crawled page becomes one markdown document: an optional front-matter
//! block, the title as a level-1 heading, then the cleaned body.

use crate::output::traits::ExtractionResult;

/// Capture mode recorded in document metadata
const CAPTURE_MODE: &str = "enhanced";

/// Formats a crawled page as a markdown document
///
/// # Arguments
///
/// * `result` - The page's extraction result
/// * `include_metadata` - Prefix the document with a front-matter block
///
/// # Returns
///
/// The complete document text
pub fn format_document(result: &ExtractionResult, include_metadata: bool) -> String {
    let title = if result.title.trim().is_empty() {
        "Untitled"
    } else {
        result.title.trim()
    };

    let mut doc = String::new();

    if include_metadata {
        doc.push_str("---\n");
        doc.push_str(&format!("url: {}\n", result.url));
        doc.push_str(&format!("title: {}\n", single_line(title)));
        doc.push_str(&format!("description: {}\n", single_line(&result.description)));
        doc.push_str(&format!("crawled_at: {}\n", result.crawled_at.to_rfc3339()));
        doc.push_str(&format!("content_length: {}\n", result.content_length));
        doc.push_str(&format!("capture_mode: {}\n", CAPTURE_MODE));
        doc.push_str("---\n\n");
    }

    doc.push_str(&format!("# {}\n\n", title));
    doc.push_str(&result.content);
    if !result.content.ends_with('\n') {
        doc.push('\n');
    }

    doc
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
