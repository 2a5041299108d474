//! Mapping from page URLs to document paths

use crate::config::OutputLayout;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use url::Url;

/// Characters that cannot appear in a filename on common filesystems
const INVALID_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Hex digits of the query hash appended to names of query-bearing URLs
const QUERY_HASH_LEN: usize = 8;

/// Converts a URL into a single flat filename
///
/// Host and path are joined, invalid filename characters become `_`, leading
/// and trailing underscores are trimmed, and `.md` is appended. A URL with a
/// query string gets a short hash of the query before the extension, so
/// `/list?page=1` and `/list?page=2` land in different files.
///
/// # Examples
///
/// ```
/// use pagesift::output::url_to_filename;
///
/// assert_eq!(url_to_filename("https://docs.example.com/guide/intro"), "docs.example.com_guide_intro.md");
/// assert_eq!(url_to_filename("http://localhost:8080/"), "localhost_8080.md");
/// ```
pub fn url_to_filename(url: &str) -> String {
    let (raw, suffix) = match Url::parse(url) {
        Ok(parsed) => {
            let netloc = match parsed.port() {
                Some(port) => format!("{}:{}", parsed.host_str().unwrap_or_default(), port),
                None => parsed.host_str().unwrap_or_default().to_string(),
            };
            (format!("{}{}", netloc, parsed.path()), query_suffix(&parsed))
        }
        Err(_) => (url.to_string(), None),
    };

    let name = sanitize(&raw);
    let name = name.trim_matches('_');
    let name = if name.is_empty() { "index" } else { name };

    document_name(name, suffix.as_deref())
}

/// Converts a URL into a host/directory/file path mirroring the site
///
/// The last path segment becomes the filename; a root URL maps to
/// `host/index.md`. Query strings are hashed into the filename as in
/// [`url_to_filename`].
pub fn mirror_path(url: &str) -> PathBuf {
    let Ok(parsed) = Url::parse(url) else {
        return PathBuf::from(url_to_filename(url));
    };

    let host = match parsed.port() {
        Some(port) => format!("{}_{}", parsed.host_str().unwrap_or_default(), port),
        None => parsed.host_str().unwrap_or_default().to_string(),
    };

    let segments = parsed
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .map(sanitize)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let suffix = query_suffix(&parsed);
    let mut path = PathBuf::from(sanitize(&host));
    match segments.split_last() {
        Some((last, dirs)) => {
            path.extend(dirs);
            path.push(document_name(last, suffix.as_deref()));
        }
        None => path.push(document_name("index", suffix.as_deref())),
    }

    path
}

/// Path of a URL's document relative to the output directory
pub fn relative_path(layout: OutputLayout, url: &str) -> PathBuf {
    match layout {
        OutputLayout::Flat => PathBuf::from(url_to_filename(url)),
        OutputLayout::Mirror => mirror_path(url),
    }
}

/// Short sha256 of a non-empty query string
fn query_suffix(url: &Url) -> Option<String> {
    let query = url.query().filter(|q| !q.is_empty())?;
    let digest = hex::encode(Sha256::digest(query.as_bytes()));
    Some(digest[..QUERY_HASH_LEN].to_string())
}

fn document_name(stem: &str, suffix: Option<&str>) -> String {
    let stem = stem.strip_suffix(".md").unwrap_or(stem);
    match suffix {
        Some(suffix) => format!("{}_{}.md", stem, suffix),
        None => format!("{}.md", stem),
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
