//! Internal/external link classification
//!
//! A link is internal when it has no host of its own (a relative reference or
//! a host-less scheme such as `mailto:`) or when its host equals the host of
//! the page it was found on. Scheme and port are ignored. Anything that cannot
//! be parsed is external.

use crate::url::domain::extract_host;
use url::{ParseError, Url};

/// Where an anchor points relative to the crawled page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    Internal,
    External,
}

impl LinkKind {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Classifies `href` relative to the page at `base_url`
///
/// If `base_url` does not parse, every link is external.
///
/// # Examples
///
/// ```
/// use url_analyzer::url::{classify_link, LinkKind};
///
/// let base = "https://example.com/";
/// assert_eq!(classify_link(base, "/about"), LinkKind::Internal);
/// assert_eq!(classify_link(base, "http://example.com:8080/x"), LinkKind::Internal);
/// assert_eq!(classify_link(base, "https://other.com/x"), LinkKind::External);
/// ```
pub fn classify_link(base_url: &str, href: &str) -> LinkKind {
    match Url::parse(base_url) {
        Ok(base) => classify_link_with_base(&base, href),
        Err(_) => LinkKind::External,
    }
}

/// Classifies `href` against an already parsed base URL
pub fn classify_link_with_base(base: &Url, href: &str) -> LinkKind {
    let link_host = match Url::parse(href) {
        Ok(link) => extract_host(&link).map(str::to_owned),
        // Relative references carry no host unless they are scheme-relative
        // (`//other.com/x`); resolving against the base exposes that host.
        Err(ParseError::RelativeUrlWithoutBase) => match base.join(href) {
            Ok(resolved) if href.trim_start().starts_with("//") => {
                extract_host(&resolved).map(str::to_owned)
            }
            Ok(_) => None,
            Err(_) => return LinkKind::External,
        },
        Err(_) => return LinkKind::External,
    };

    match link_host {
        None => LinkKind::Internal,
        Some(host) if Some(host.as_str()) == extract_host(base) => LinkKind::Internal,
        Some(_) => LinkKind::External,
    }
}
