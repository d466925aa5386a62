//! URL handling module for URL Analyzer
//!
//! This module validates submitted target URLs and classifies anchor hrefs
//! as internal or external relative to the crawled page.

mod classify;
mod domain;

use crate::AnalyzerError;
use url::Url;

// Re-export main functions
pub use classify::{classify_link, classify_link_with_base, LinkKind};
pub use domain::extract_host;

/// Validates a crawl target
///
/// A target must be a syntactically valid absolute URL with an `http` or
/// `https` scheme and a host. No network access happens here.
///
/// # Examples
///
/// ```
/// use url_analyzer::url::validate_target_url;
///
/// assert!(validate_target_url("https://example.com/").is_ok());
/// assert!(validate_target_url("/relative/path").is_err());
/// assert!(validate_target_url("ftp://example.com/").is_err());
/// ```
pub fn validate_target_url(target: &str) -> Result<Url, AnalyzerError> {
    let invalid = |reason: String| AnalyzerError::InvalidUrl {
        url: target.to_string(),
        reason,
    };

    let url = Url::parse(target.trim()).map_err(|e| invalid(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    if extract_host(&url).is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_targets() {
        assert!(validate_target_url("https://example.com").is_ok());
        assert!(validate_target_url("http://example.com:8080/path?q=1").is_ok());
        assert!(validate_target_url("  https://example.com/  ").is_ok());
    }

    #[test]
    fn test_relative_target_rejected() {
        let err = validate_target_url("example.com/page").unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidUrl { .. }));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        assert!(validate_target_url("mailto:someone@example.com").is_err());
        assert!(validate_target_url("javascript:alert(1)").is_err());
        assert!(validate_target_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(validate_target_url("").is_err());
        assert!(validate_target_url("not a url").is_err());
        assert!(validate_target_url("https://exa mple.com").is_err());
    }
}
