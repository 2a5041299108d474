//! Line-level formatting and whitespace normalization

use crate::url::strip_tracking_params;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Line-start callout markers and their quote-block replacements
const ADMONITIONS: &[(&str, &str)] = &[
    ("Note:", "> **Note:**"),
    ("NOTE:", "> **Note:**"),
    ("Tip:", "> **Tip:**"),
    ("TIP:", "> **Tip:**"),
    ("Warning:", "> **⚠️ Warning:**"),
    ("WARNING:", "> **⚠️ Warning:**"),
    ("Important:", "> **❗ Important:**"),
    ("IMPORTANT:", "> **❗ Important:**"),
    ("Caution:", "> **Caution:**"),
    ("CAUTION:", "> **Caution:**"),
];

static URL_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s)\]>"']+"#).expect("BUG: hardcoded URL regex is invalid")
});

/// Applies admonition markup and strips link tracking from one kept line
pub fn enhance_line(line: &str) -> String {
    if line.trim().is_empty() {
        return line.to_string();
    }

    let line = promote_admonition(line);
    strip_link_tracking(&line).into_owned()
}

fn promote_admonition(line: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);

    for (marker, replacement) in ADMONITIONS {
        if let Some(tail) = rest.strip_prefix(marker) {
            return format!("{}{}{}", indent, replacement, tail);
        }
    }

    line.to_string()
}

fn strip_link_tracking(line: &str) -> Cow<'_, str> {
    if !line.contains("http") {
        return Cow::Borrowed(line);
    }
    URL_IN_TEXT.replace_all(line, |caps: &regex::Captures<'_>| strip_tracking_params(&caps[0]))
}

/// Trims trailing whitespace, collapses blank-line runs to a single blank
/// line and removes leading and trailing blank lines
///
/// Applying this twice gives the same result as applying it once.
pub fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in text.lines().map(str::trim_end) {
        let blank = line.is_empty();
        if blank && (previous_blank || lines.is_empty()) {
            continue;
        }
        lines.push(line);
        previous_blank = blank;
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
