use super::classifier::ContentCleaner;
use crate::extract::SelectorExtractor;
use serde::{Deserialize, Serialize};

/// Body written when nothing usable survives cleaning
pub const NO_CONTENT_PLACEHOLDER: &str =
    "[No substantial content could be extracted from this page]";

/// Where a cleaned body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentSource {
    /// Selector extraction, then the line classifier
    Selector,
    /// The line classifier over the rendered body
    LineCascade,
    /// The line classifier over the fetcher's rawer capture
    RawFallback,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedContent {
    pub text: String,
    pub source: ContentSource,
}

impl CleanedContent {
    pub fn len(&self) -> usize {
        self.text.trim().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Selector-first extraction with line-classifier fallback
///
/// When the extractor has rules and its output reaches the cleaner's minimum
/// content length, that output is cleaned. Otherwise the rendered body is
/// cleaned instead.
///
/// # Arguments
///
/// * `extractor` - Structural rules; may be unconfigured
/// * `cleaner` - Line classifier
/// * `html` - Raw page markup
/// * `body` - Markdown-like rendering of the page
/// * `title` - Page title
pub fn extract_and_clean(
    extractor: &SelectorExtractor,
    cleaner: &ContentCleaner,
    html: &str,
    body: &str,
    title: &str,
) -> CleanedContent {
    if extractor.is_configured() && !html.trim().is_empty() {
        let selected = extractor.extract(html);
        let selected_len = selected.chars().count();

        if selected_len >= cleaner.min_content_length() {
            return CleanedContent {
                text: cleaner.clean(&selected, title),
                source: ContentSource::Selector,
            };
        }

        tracing::debug!(
            "Selector yield {} chars below minimum {}, using line classifier",
            selected_len,
            cleaner.min_content_length()
        );
    }

    CleanedContent {
        text: cleaner.clean(body, title),
        source: ContentSource::LineCascade,
    }
}

/// Applies the too-short policy to a cleaned body
///
/// A body at or above the minimum length is returned unchanged. A shorter one
/// is replaced by the cleaned rawer capture only if that yields more text, so
/// footer truncation still applies to the fallback. An empty result becomes
/// [`NO_CONTENT_PLACEHOLDER`].
pub fn apply_length_fallback(
    cleaned: CleanedContent,
    cleaner: &ContentCleaner,
    raw_fallback: Option<&str>,
    title: &str,
) -> CleanedContent {
    if cleaned.len() >= cleaner.min_content_length() {
        return cleaned;
    }

    if let Some(raw) = raw_fallback.filter(|raw| !raw.trim().is_empty()) {
        let recleaned = CleanedContent {
            text: cleaner.clean(raw, title),
            source: ContentSource::RawFallback,
        };
        if recleaned.len() > cleaned.len() {
            tracing::debug!(
                "Using rawer capture ({} chars instead of {})",
                recleaned.len(),
                cleaned.len()
            );
            return recleaned;
        }
    }

    if cleaned.is_empty() {
        return CleanedContent {
            text: NO_CONTENT_PLACEHOLDER.to_string(),
            source: ContentSource::Placeholder,
        };
    }

    cleaned
}
