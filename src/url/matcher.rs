use regex::Regex;

/// A compiled wildcard URL pattern
///
/// Wildcards:
/// - `*` matches any run of characters except `/`
/// - `**` matches any run of characters including `/`
/// - `?` matches exactly one character
///
/// Everything else is matched literally and the whole URL must match. A `*`
/// at the very start of a pattern also spans the scheme and host, so
/// `*/docs/*` can be written without spelling out `https://example.com`.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    regex: Option<Regex>,
}

impl UrlPattern {
    /// Compiles a wildcard pattern
    ///
    /// Compilation never fails; a pattern that cannot be turned into a regex
    /// simply matches nothing.
    pub fn compile(pattern: &str) -> Self {
        let regex = match Regex::new(&wildcard_to_regex(pattern)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::debug!("Pattern '{}' matches nothing: {}", pattern, e);
                None
            }
        };

        Self {
            source: pattern.to_string(),
            regex,
        }
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(url))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Include/exclude rule set used to admit discovered URLs
///
/// A URL is admitted when it matches no exclude pattern and either the
/// include list is empty or it matches at least one include pattern.
/// Exclusion is checked first.
///
/// # Examples
///
/// ```
/// use pagesift::url::PatternMatcher;
///
/// let matcher = PatternMatcher::new(&["*/docs/**"], &["*/docs/internal/**"]);
/// assert!(matcher.admits("https://example.com/docs/guide/intro"));
/// assert!(!matcher.admits("https://example.com/docs/internal/secrets"));
/// assert!(!matcher.admits("https://example.com/blog/post"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    include: Vec<UrlPattern>,
    exclude: Vec<UrlPattern>,
}

impl PatternMatcher {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Self {
        Self {
            include: include.iter().map(|p| UrlPattern::compile(p.as_ref())).collect(),
            exclude: exclude.iter().map(|p| UrlPattern::compile(p.as_ref())).collect(),
        }
    }

    /// A matcher with no rules admits every URL
    pub fn admit_all() -> Self {
        Self::default()
    }

    pub fn admits(&self, url: &str) -> bool {
        if self.exclude.iter().any(|p| p.is_match(url)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|p| p.is_match(url))
    }

    pub fn include_patterns(&self) -> impl Iterator<Item = &str> {
        self.include.iter().map(UrlPattern::as_str)
    }

    pub fn exclude_patterns(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(UrlPattern::as_str)
    }
}

/// One-shot admission check that compiles the patterns on every call
pub fn matches<S: AsRef<str>>(url: &str, include: &[S], exclude: &[S]) -> bool {
    PatternMatcher::new(include, exclude).admits(url)
}

/// Converts a wildcard pattern into an anchored regex
fn wildcard_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');

    let mut chars = pattern.chars().peekable();
    let mut at_start = true;
    let mut literal = String::new();

    while let Some(c) = chars.next() {
        match c {
            '*' | '?' => {
                regex.push_str(&regex::escape(&literal));
                literal.clear();

                if c == '?' {
                    regex.push('.');
                } else if chars.peek() == Some(&'*') {
                    chars.next();
                    regex.push_str(".*");
                } else if at_start {
                    regex.push_str(".*");
                } else {
                    regex.push_str("[^/]*");
                }
            }
            _ => literal.push(c),
        }
        at_start = false;
    }

    regex.push_str(&regex::escape(&literal));
    regex.push('$');
    regex
}
