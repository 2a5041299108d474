use crate::config::CleaningConfig;
use serde::{Deserialize, Serialize};

/// Terms that mark a line as navigation
///
/// The first five are the strongest signals and are the only ones checked
/// when deciding whether a plain paragraph is substantial.
pub const NAV_INDICATORS: &[&str] = &[
    "search",
    "menu",
    "navigation",
    "navbar",
    "sidebar",
    "breadcrumb",
    "home",
    "contact",
    "about",
    "login",
    "sign in",
    "sign up",
    "register",
    "skip to content",
    "skip to main",
    "toggle menu",
    "close menu",
];

/// Terms whose first appearance ends the document
pub const FOOTER_INDICATORS: &[&str] = &[
    "copyright",
    "©",
    "all rights reserved",
    "privacy policy",
    "terms of service",
    "terms of use",
    "cookie policy",
    "was this page helpful",
    "feedback",
    "x.com",
    "twitter.com",
    "linkedin.com",
    "facebook.com",
    "github.com",
    "on this page",
    "yesno",
    "rate this page",
    "improve this page",
    "last modified",
    "last updated",
    "edit this page",
];

/// Terms that drop a line wherever it appears
pub const SKIP_PATTERNS: &[&str] = &[
    "copy page",
    "copy link",
    "share this",
    "print this page",
    "bookmark",
    "loading...",
    "please wait",
    "skip to content",
    "toggle navigation",
];

const STRICT_NAV_EXTRAS: &[&str] = &["menu", "nav", "sidebar", "header", "footer"];
const STRICT_SKIP_EXTRAS: &[&str] = &["advertisement", "sponsored", "promotion"];

/// Named bundle of threshold and term-list adjustments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleaningProfile {
    /// Higher length bar and extra navigation/advertising terms
    Strict,
    #[default]
    Moderate,
    /// Lower length bar, default term lists
    Minimal,
}

impl CleaningProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Moderate => "moderate",
            Self::Minimal => "minimal",
        }
    }

    /// Minimum plausible length of a cleaned body, in characters
    pub fn min_content_length(&self) -> usize {
        match self {
            Self::Strict => 200,
            Self::Moderate => 100,
            Self::Minimal => 50,
        }
    }
}

impl std::str::FromStr for CleaningProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "moderate" => Ok(Self::Moderate),
            "minimal" => Ok(Self::Minimal),
            other => Err(format!(
                "expected 'strict', 'moderate' or 'minimal', got '{}'",
                other
            )),
        }
    }
}

/// Term lists and thresholds driving the line classifier
///
/// All terms are stored lowercase and matched as substrings of the lowercased
/// line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerConfig {
    pub profile: CleaningProfile,
    pub nav_indicators: Vec<String>,
    pub footer_indicators: Vec<String>,
    pub skip_patterns: Vec<String>,
    pub min_content_length: usize,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self::from_profile(CleaningProfile::default())
    }
}

impl CleanerConfig {
    /// Default term lists adjusted by a profile
    pub fn from_profile(profile: CleaningProfile) -> Self {
        let mut config = Self {
            profile,
            nav_indicators: owned(NAV_INDICATORS),
            footer_indicators: owned(FOOTER_INDICATORS),
            skip_patterns: owned(SKIP_PATTERNS),
            min_content_length: profile.min_content_length(),
        };

        if profile == CleaningProfile::Strict {
            extend_unique(&mut config.nav_indicators, STRICT_NAV_EXTRAS);
            extend_unique(&mut config.skip_patterns, STRICT_SKIP_EXTRAS);
        }

        config
    }

    /// Appends caller-supplied terms to the lists
    pub fn with_custom<S: AsRef<str>>(mut self, nav: &[S], footer: &[S], skip: &[S]) -> Self {
        extend_unique(&mut self.nav_indicators, nav);
        extend_unique(&mut self.footer_indicators, footer);
        extend_unique(&mut self.skip_patterns, skip);
        self
    }

    pub fn with_min_content_length(mut self, min: usize) -> Self {
        self.min_content_length = min;
        self
    }

    pub fn from_settings(settings: &CleaningConfig) -> Self {
        let config = Self::from_profile(settings.profile).with_custom(
            &settings.nav_patterns,
            &settings.footer_patterns,
            &settings.skip_patterns,
        );

        match settings.min_content_length {
            Some(min) => config.with_min_content_length(min),
            None => config,
        }
    }

    /// The strongest navigation signals
    pub fn primary_nav_indicators(&self) -> &[String] {
        let n = self.nav_indicators.len().min(5);
        &self.nav_indicators[..n]
    }
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

fn extend_unique<S: AsRef<str>>(target: &mut Vec<String>, extra: &[S]) {
    for term in extra {
        let term = term.as_ref().trim().to_lowercase();
        if !term.is_empty() && !target.contains(&term) {
            target.push(term);
        }
    }
}
