//! Re-segmenting documents that arrive as one run-on line

use regex::Regex;
use std::sync::LazyLock;

/// Documents with fewer line breaks than this are candidates for reflow
const MIN_LINE_BREAKS: usize = 10;

/// ... and must also be longer than this many characters
const MIN_RUN_ON_CHARS: usize = 500;

/// Tokens ending in a period that do not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "cf.", "vs.", "viz.", "etc.", "mr.", "mrs.", "ms.", "dr.", "st.", "no.",
    "fig.", "approx.",
];

static SENTENCE_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\. ([A-Z])").expect("BUG: hardcoded sentence boundary regex is invalid")
});

static INLINE_ADMONITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Note|Tip|Warning|Important|Caution)\s+([A-Z])")
        .expect("BUG: hardcoded admonition regex is invalid")
});

static SECTION_STARTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(Using|Creating|Configuring|Setting up|Installing|Troubleshooting|Managing|Building|Deploying)\s+([a-z][^.\n]*?)\s([A-Z])",
    )
    .expect("BUG: hardcoded section starter regex is invalid")
});

/// Repairs escaped newlines and run-on text
///
/// Literal `\n` sequences are unescaped when they outnumber real line
/// breaks. A long document with almost no line breaks then gets paragraph
/// breaks at sentence ends, admonitions promoted to quote blocks and common
/// section verbs promoted to level-2 headings.
pub fn reflow(text: &str) -> String {
    let mut text = unescape_newlines(text);

    if is_run_on(&text) {
        text = split_sentences(&text);
        text = promote_admonitions(&text);
        text = promote_section_starters(&text);
    }

    text
}

fn unescape_newlines(text: &str) -> String {
    let escaped = text.matches("\\n").count();
    if escaped > 0 && escaped > text.matches('\n').count() {
        text.replace("\\n", "\n")
    } else {
        text.to_string()
    }
}

pub fn is_run_on(text: &str) -> bool {
    text.matches('\n').count() < MIN_LINE_BREAKS && text.chars().count() > MIN_RUN_ON_CHARS
}

/// Inserts a paragraph break after each sentence-ending period
fn split_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;

    for m in SENTENCE_BOUNDARY.find_iter(text) {
        let period_end = m.start() + 1;
        if ends_with_abbreviation(&text[..period_end]) {
            continue;
        }

        out.push_str(&text[last..period_end]);
        out.push_str("\n\n");
        // resume at the capital letter, dropping the space
        last = m.start() + 2;
    }

    out.push_str(&text[last..]);
    out
}

fn ends_with_abbreviation(before: &str) -> bool {
    let token = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();

    if ABBREVIATIONS.contains(&token.as_str()) {
        return true;
    }

    // single-letter initials such as "J."
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_alphabetic()
    )
}

fn promote_admonitions(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;

    for caps in INLINE_ADMONITION.captures_iter(text) {
        let (Some(whole), Some(keyword), Some(capital)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if text[..whole.start()].ends_with('\n') {
            continue;
        }

        out.push_str(text[last..whole.start()].trim_end());
        out.push_str("\n\n> **");
        out.push_str(keyword.as_str());
        out.push_str(":** ");
        out.push_str(capital.as_str());
        last = whole.end();
    }

    out.push_str(&text[last..]);
    out
}

fn promote_section_starters(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;
    let mut search_from = 0;

    while let Some(caps) = SECTION_STARTER.captures_at(text, search_from) {
        let (Some(whole), Some(verb), Some(phrase), Some(capital)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            break;
        };

        let before = text[last..whole.start()].trim_end();
        out.push_str(before);
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str("## ");
        out.push_str(verb.as_str());
        out.push(' ');
        out.push_str(phrase.as_str().trim_end());
        out.push_str("\n\n");

        // the capital opens the next paragraph and may start another match
        last = capital.start();
        search_from = capital.start();
    }

    out.push_str(&text[last..]);
    out
}
