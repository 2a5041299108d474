use super::format::{enhance_line, normalize_whitespace};
use super::profile::CleanerConfig;
use super::reflow::reflow;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Lines opening a navigation block before the main content
const NAV_SECTION_OPENERS: &[&str] = &[
    "search",
    "navigation",
    "menu",
    "breadcrumb",
    "skip to",
    "table of contents",
    "getting started",
    "##### getting started",
    "##### build with",
    "##### deployment",
    "##### administration",
    "##### configuration",
    "##### reference",
];

/// Bare navigation labels still dropped after content has started
const INLINE_NAV_TERMS: &[&str] =
    &["overview", "quickstart", "getting started", "reference", "home"];

/// Words that disqualify a level-1 heading as the content start
const H1_NAV_TERMS: &[&str] = &["home", "menu", "navigation", "page"];

/// Lines shorter than this that carry an inline nav term are dropped
const SHORT_NAV_LINE_CHARS: usize = 100;

/// More link markers than this make a line a link menu
const LINK_MENU_THRESHOLD: usize = 3;

static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{2,6}\s+\w").expect("BUG: hardcoded heading regex is invalid")
});

static HEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{2,6}\s+").expect("BUG: hardcoded heading marker regex is invalid")
});

static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\s").expect("BUG: hardcoded list item regex is invalid")
});

/// Per-document classification state
///
/// Created fresh for every call to [`ContentCleaner::clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClassificationState {
    content_started: bool,
    in_footer: bool,
    skip_navigation: bool,
}

impl Default for ClassificationState {
    fn default() -> Self {
        Self {
            content_started: false,
            in_footer: false,
            skip_navigation: true,
        }
    }
}

/// What happens to one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineVerdict {
    Keep,
    /// Blank line before the content start
    LeadingBlank,
    /// First footer line; it and everything after it are discarded
    Footer,
    Skip,
    NavigationSection,
    /// Chrome before the content start
    PreContent,
    /// Link menu or bare nav label after the content start
    LateNavigation,
}

/// Heuristic line classifier separating main content from page chrome
///
/// # Pipeline
///
/// 1. Repair escaped newlines and run-on text
/// 2. Classify each line, dropping navigation and stopping at the footer
/// 3. Promote admonitions and strip link tracking on kept lines
/// 4. Normalize whitespace
///
/// Footer detection always wins: the first footer-like line ends the
/// document, even if content-like lines follow it.
///
/// # Example
///
/// ```
/// use pagesift::ContentCleaner;
///
/// let cleaner = ContentCleaner::default();
/// let text = "Menu\n## Installing the tool\nRun the installer and follow the prompts.\nCopyright 2024";
/// let cleaned = cleaner.clean(text, "Installing the tool");
/// assert_eq!(cleaned, "## Installing the tool\nRun the installer and follow the prompts.");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentCleaner {
    config: CleanerConfig,
}

impl ContentCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    pub fn min_content_length(&self) -> usize {
        self.config.min_content_length
    }

    /// Cleans a rendered document body
    ///
    /// # Arguments
    ///
    /// * `text` - Markdown-like body from the fetcher or selector extraction
    /// * `title` - Page title, used to recognise the main heading; may be empty
    pub fn clean(&self, text: &str, title: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let text = reflow(text);
        let mut state = ClassificationState::default();
        let mut kept = Vec::new();

        for line in text.lines() {
            match self.classify(line, title, &mut state) {
                LineVerdict::Keep => kept.push(enhance_line(line)),
                LineVerdict::Footer => break,
                _ => {}
            }
        }

        normalize_whitespace(&kept.join("\n"))
    }

    /// Classifies every line of a document without rewriting it
    ///
    /// Lines after the footer are not returned.
    pub fn classify_lines<'t>(&self, text: &'t str, title: &str) -> Vec<(LineVerdict, &'t str)> {
        let mut state = ClassificationState::default();
        let mut verdicts = Vec::new();

        for line in text.lines() {
            let verdict = self.classify(line, title, &mut state);
            verdicts.push((verdict, line));
            if verdict == LineVerdict::Footer {
                break;
            }
        }

        verdicts
    }

    fn classify(&self, line: &str, title: &str, state: &mut ClassificationState) -> LineVerdict {
        let stripped = line.trim();
        let lower = stripped.to_lowercase();

        if !state.content_started && stripped.is_empty() {
            return LineVerdict::LeadingBlank;
        }

        if !state.in_footer && contains_any(&lower, &self.config.footer_indicators) {
            state.in_footer = true;
            return LineVerdict::Footer;
        }

        if contains_any(&lower, &self.config.skip_patterns) {
            return LineVerdict::Skip;
        }

        if state.skip_navigation && contains_any(&lower, NAV_SECTION_OPENERS) {
            return LineVerdict::NavigationSection;
        }

        if !state.content_started {
            if !self.is_content_start(stripped, &lower, title) {
                return LineVerdict::PreContent;
            }
            state.content_started = true;
            state.skip_navigation = false;
        }

        if is_late_navigation(stripped, &lower) {
            return LineVerdict::LateNavigation;
        }

        LineVerdict::Keep
    }

    fn is_content_start(&self, line: &str, lower: &str, title: &str) -> bool {
        self.is_main_heading(line, title)
            || self.is_section_heading(line)
            || self.is_substantial_paragraph(line, lower)
            || self.is_content_list(line, lower)
            || is_code(line)
    }

    fn is_main_heading(&self, line: &str, title: &str) -> bool {
        let Some(heading) = line.strip_prefix("# ") else {
            return false;
        };
        let heading = heading.trim().to_lowercase();

        if contains_any(&heading, H1_NAV_TERMS) {
            return false;
        }

        if !title.trim().is_empty() {
            let title_lower = title.to_lowercase();
            let title_words: HashSet<&str> = title_lower.split_whitespace().collect();
            let heading_words: HashSet<&str> = heading.split_whitespace().collect();
            let shared = title_words.intersection(&heading_words).count();
            if shared as f64 / title_words.len().max(1) as f64 >= 0.5 {
                return true;
            }
        }

        heading.chars().count() > 10
    }

    fn is_section_heading(&self, line: &str) -> bool {
        if !SECTION_HEADING.is_match(line) || line.chars().count() <= 10 {
            return false;
        }

        let heading = HEADING_MARKER.replace(line, "").trim().to_lowercase();
        !contains_any(&heading, &self.config.nav_indicators)
    }

    fn is_substantial_paragraph(&self, line: &str, lower: &str) -> bool {
        line.chars().count() >= 20
            && line.split_whitespace().count() >= 4
            && !contains_any(lower, self.config.primary_nav_indicators())
    }

    fn is_content_list(&self, line: &str, lower: &str) -> bool {
        let is_item =
            line.starts_with("- ") || line.starts_with("* ") || NUMBERED_ITEM.is_match(line);
        is_item && line.chars().count() >= 10 && !contains_any(lower, &self.config.nav_indicators)
    }
}

fn is_code(line: &str) -> bool {
    line.starts_with('`')
}

fn is_late_navigation(line: &str, lower: &str) -> bool {
    if line.matches('[').count() > LINK_MENU_THRESHOLD
        && line.matches("](").count() > LINK_MENU_THRESHOLD
    {
        return true;
    }

    line.chars().count() < SHORT_NAV_LINE_CHARS && contains_any(lower, INLINE_NAV_TERMS)
}

fn contains_any<S: AsRef<str>>(haystack: &str, needles: &[S]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_ref()))
}
