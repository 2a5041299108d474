//! Content classification and cleaning
//!
//! Turns a loosely structured page body into clean text: run-on repair, a
//! line-by-line heuristic cascade that drops navigation and stops at the
//! footer, formatting fixes and whitespace normalization. Profiles and
//! custom term lists tune the cascade, and [`extract_and_clean`] runs
//! selector extraction ahead of it.

mod classifier;
mod format;
mod pipeline;
mod profile;
mod reflow;

pub use classifier::{ContentCleaner, LineVerdict};
pub use format::{enhance_line, normalize_whitespace};
pub use pipeline::{
    apply_length_fallback, extract_and_clean, CleanedContent, ContentSource,
    NO_CONTENT_PLACEHOLDER,
};
pub use profile::{
    CleanerConfig, CleaningProfile, FOOTER_INDICATORS, NAV_INDICATORS, SKIP_PATTERNS,
};
pub use reflow::reflow;
