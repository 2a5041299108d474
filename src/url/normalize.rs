use crate::UrlError;
use url::Url;

/// Query parameters that only carry click-tracking data
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref"];

/// Normalizes a link into the form used for frontier membership
///
/// # Normalization Steps
///
/// 1. Resolve `href` against `base` when one is given
/// 2. Reject anything that is not http(s) or has no host
/// 3. Remove the fragment
/// 4. Remove a trailing slash unless the path is the root
///
/// The query string is kept as-is. Host case is lowered by the URL parser.
///
/// # Arguments
///
/// * `href` - The link as found on the page, absolute or relative
/// * `base` - The URL of the page the link was found on
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or resolve the link
///
/// # Examples
///
/// ```
/// use pagesift::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = normalize_url("guide/#install", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/guide");
/// ```
pub fn normalize_url(href: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let parsed = match base {
        Some(base) => base.join(href.trim()),
        None => Url::parse(href.trim()),
    };
    let mut url = parsed.map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    Ok(url)
}

/// Removes click-tracking parameters from a URL string
///
/// Returns the input unchanged when it does not parse as a URL or carries no
/// tracking parameters.
pub fn strip_tracking_params(url_str: &str) -> String {
    let mut url = match Url::parse(url_str) {
        Ok(url) => url,
        Err(_) => return url_str.to_string(),
    };

    if url.query().is_none() {
        return url_str.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !pairs.iter().any(|(k, _)| is_tracking_param(k)) {
        return url_str.to_string();
    }

    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| !is_tracking_param(k))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    url.to_string()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/start").unwrap()
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_is_kept() {
        let result = normalize_url("https://example.com/search/?q=rust&page=2", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/search?q=rust&page=2");
    }

    #[test]
    fn test_resolve_relative_links() {
        let base = base();
        assert_eq!(
            normalize_url("install", Some(&base)).unwrap().as_str(),
            "https://example.com/docs/install"
        );
        assert_eq!(
            normalize_url("/api/", Some(&base)).unwrap().as_str(),
            "https://example.com/api"
        );
        assert_eq!(
            normalize_url("../about#team", Some(&base)).unwrap().as_str(),
            "https://example.com/about"
        );
    }

    #[test]
    fn test_fragment_only_link_resolves_to_page() {
        let base = base();
        let result = normalize_url("#top", Some(&base)).unwrap();
        assert_eq!(result.as_str(), "https://example.com/docs/start");
    }

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("https://EXAMPLE.COM/Page", None).unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_invalid_scheme() {
        let base = base();
        let result = normalize_url("mailto:team@example.com", Some(&base));
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url", None).is_err());
    }

    #[test]
    fn test_strip_tracking_params() {
        assert_eq!(
            strip_tracking_params("https://example.com/page?utm_source=news&id=4"),
            "https://example.com/page?id=4"
        );
        assert_eq!(
            strip_tracking_params("https://example.com/page?fbclid=abc&utm_medium=x"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_strip_tracking_params_leaves_clean_urls() {
        let url = "https://example.com/page?id=4";
        assert_eq!(strip_tracking_params(url), url);
        assert_eq!(strip_tracking_params("not a url"), "not a url");
    }
}
