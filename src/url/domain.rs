use url::Url;

/// Extracts the host from a URL
///
/// Returns None for URLs without a host (e.g. `mailto:` or `data:` URLs) and
/// for an empty host. The `url` crate already lowercases domain hosts.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use url_analyzer::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com"));
///
/// let url = Url::parse("mailto:admin@example.com").unwrap();
/// assert_eq!(extract_host(&url), None);
/// ```
pub fn extract_host(url: &Url) -> Option<&str> {
    url.host_str().filter(|h| !h.is_empty())
}
