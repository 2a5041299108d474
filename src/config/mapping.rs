//! Flat `section.key → value` view of [`CrawlSettings`]
//!
//! Every setting is listed by hand in both directions. Lists are joined with
//! `|`, headers are written as `Name: value`, and an empty string clears an
//! optional value.

use crate::config::types::CrawlSettings;
use crate::ConfigError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

const LIST_SEPARATOR: &str = "|";

/// Every key accepted by [`apply_setting`], in display order
pub const SETTING_KEYS: &[&str] = &[
    "crawler.max-depth",
    "crawler.max-pages",
    "crawler.include-external",
    "crawler.concurrency",
    "crawler.delay-ms",
    "crawler.timeout-secs",
    "crawler.cache",
    "crawler.retry-attempts",
    "identity.rotate-user-agents",
    "identity.user-agents",
    "identity.user-agent",
    "identity.headers",
    "identity.proxy",
    "extraction.method",
    "extraction.template",
    "extraction.selectors",
    "extraction.queries",
    "extraction.exclude-selectors",
    "extraction.exclude-queries",
    "cleaning.profile",
    "cleaning.min-content-length",
    "cleaning.nav-patterns",
    "cleaning.footer-patterns",
    "cleaning.skip-patterns",
    "output.directory",
    "output.layout",
    "output.include-metadata",
    "output.preview-limit",
];

/// Serializes settings into a flat key/value map
pub fn settings_to_map(settings: &CrawlSettings) -> BTreeMap<String, String> {
    let crawler = &settings.crawler;
    let identity = &settings.identity;
    let extraction = &settings.extraction;
    let cleaning = &settings.cleaning;
    let output = &settings.output;

    let headers = identity
        .headers
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>();

    let entries: [(&str, String); 28] = [
        ("crawler.max-depth", crawler.max_depth.to_string()),
        ("crawler.max-pages", crawler.max_pages.to_string()),
        ("crawler.include-external", crawler.include_external.to_string()),
        ("crawler.concurrency", crawler.concurrency.to_string()),
        ("crawler.delay-ms", crawler.delay_ms.to_string()),
        ("crawler.timeout-secs", crawler.timeout_secs.to_string()),
        ("crawler.cache", crawler.cache.to_string()),
        ("crawler.retry-attempts", crawler.retry_attempts.to_string()),
        (
            "identity.rotate-user-agents",
            identity.rotate_user_agents.to_string(),
        ),
        ("identity.user-agents", join_list(&identity.user_agents)),
        (
            "identity.user-agent",
            identity.user_agent.clone().unwrap_or_default(),
        ),
        ("identity.headers", join_list(&headers)),
        ("identity.proxy", identity.proxy.clone().unwrap_or_default()),
        ("extraction.method", extraction.method.as_str().to_string()),
        (
            "extraction.template",
            extraction.template.clone().unwrap_or_default(),
        ),
        ("extraction.selectors", join_list(&extraction.selectors)),
        ("extraction.queries", join_list(&extraction.queries)),
        (
            "extraction.exclude-selectors",
            join_list(&extraction.exclude_selectors),
        ),
        (
            "extraction.exclude-queries",
            join_list(&extraction.exclude_queries),
        ),
        ("cleaning.profile", cleaning.profile.as_str().to_string()),
        (
            "cleaning.min-content-length",
            cleaning
                .min_content_length
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ),
        ("cleaning.nav-patterns", join_list(&cleaning.nav_patterns)),
        ("cleaning.footer-patterns", join_list(&cleaning.footer_patterns)),
        ("cleaning.skip-patterns", join_list(&cleaning.skip_patterns)),
        (
            "output.directory",
            output.directory.to_string_lossy().into_owned(),
        ),
        ("output.layout", output.layout.as_str().to_string()),
        ("output.include-metadata", output.include_metadata.to_string()),
        ("output.preview-limit", output.preview_limit.to_string()),
    ];

    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Applies a single `section.key = value` assignment
pub fn apply_setting(
    settings: &mut CrawlSettings,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let value = value.trim();

    match key {
        "crawler.max-depth" => settings.crawler.max_depth = parse_value(key, value)?,
        "crawler.max-pages" => settings.crawler.max_pages = parse_value(key, value)?,
        "crawler.include-external" => settings.crawler.include_external = parse_value(key, value)?,
        "crawler.concurrency" => settings.crawler.concurrency = parse_value(key, value)?,
        "crawler.delay-ms" => settings.crawler.delay_ms = parse_value(key, value)?,
        "crawler.timeout-secs" => settings.crawler.timeout_secs = parse_value(key, value)?,
        "crawler.cache" => settings.crawler.cache = parse_value(key, value)?,
        "crawler.retry-attempts" => settings.crawler.retry_attempts = parse_value(key, value)?,
        "identity.rotate-user-agents" => {
            settings.identity.rotate_user_agents = parse_value(key, value)?
        }
        "identity.user-agents" => settings.identity.user_agents = split_list(value),
        "identity.user-agent" => settings.identity.user_agent = optional(value),
        "identity.headers" => {
            let mut headers = BTreeMap::new();
            for entry in split_list(value) {
                let (name, header_value) =
                    entry.split_once(':').ok_or_else(|| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: entry.clone(),
                        reason: "expected 'Name: value'".to_string(),
                    })?;
                headers.insert(name.trim().to_string(), header_value.trim().to_string());
            }
            settings.identity.headers = headers;
        }
        "identity.proxy" => settings.identity.proxy = optional(value),
        "extraction.method" => settings.extraction.method = parse_value(key, value)?,
        "extraction.template" => settings.extraction.template = optional(value),
        "extraction.selectors" => settings.extraction.selectors = split_list(value),
        "extraction.queries" => settings.extraction.queries = split_list(value),
        "extraction.exclude-selectors" => settings.extraction.exclude_selectors = split_list(value),
        "extraction.exclude-queries" => settings.extraction.exclude_queries = split_list(value),
        "cleaning.profile" => settings.cleaning.profile = parse_value(key, value)?,
        "cleaning.min-content-length" => {
            settings.cleaning.min_content_length = if value.is_empty() {
                None
            } else {
                Some(parse_value(key, value)?)
            }
        }
        "cleaning.nav-patterns" => settings.cleaning.nav_patterns = split_list(value),
        "cleaning.footer-patterns" => settings.cleaning.footer_patterns = split_list(value),
        "cleaning.skip-patterns" => settings.cleaning.skip_patterns = split_list(value),
        "output.directory" => settings.output.directory = PathBuf::from(value),
        "output.layout" => settings.output.layout = parse_value(key, value)?,
        "output.include-metadata" => settings.output.include_metadata = parse_value(key, value)?,
        "output.preview-limit" => settings.output.preview_limit = parse_value(key, value)?,
        _ => return Err(ConfigError::UnknownKey(key.to_string())),
    }

    Ok(())
}

/// Builds settings from a map, starting from defaults
///
/// Keys missing from the map keep their default values.
pub fn settings_from_map(map: &BTreeMap<String, String>) -> Result<CrawlSettings, ConfigError> {
    let mut settings = CrawlSettings::default();
    for (key, value) in map {
        apply_setting(&mut settings, key, value)?;
    }
    Ok(settings)
}

/// Parses a `key=value` override as given on the command line
pub fn parse_assignment(assignment: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidValue {
            key: assignment.to_string(),
            value: String::new(),
            reason: "expected 'section.key=value'".to_string(),
        })?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
