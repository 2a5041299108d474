use url::Url;

/// Returns the site origin of a URL: scheme, host and port
///
/// Two URLs belong to the same site when their origins are equal, so
/// `http://example.com` and `https://example.com` are different sites, as are
/// `example.com` and `www.example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use pagesift::url::site_origin;
///
/// let url = Url::parse("https://Example.com:8443/path?q=1").unwrap();
/// assert_eq!(site_origin(&url), "https://example.com:8443");
/// ```
pub fn site_origin(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// Checks whether two URLs share a site origin
pub fn same_site(a: &Url, b: &Url) -> bool {
    site_origin(a) == site_origin(b)
}
