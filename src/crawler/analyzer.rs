//! HTML analyzer for extracting structural page metrics
//!
//! This module parses a fetched document and, in one pre-order pass over the
//! node tree, extracts:
//! - HTML version (from the doctype public identifier)
//! - Page title (first `<title>`, falling back to the first `<h1>`)
//! - Heading counts per level
//! - Internal and external link counts
//! - Whether any form contains a password field

use crate::url::{classify_link_with_base, LinkKind};
use crate::AnalyzerError;
use scraper::{ElementRef, Html, Node};
use serde::Serialize;
use url::Url;

/// HTML version labels, matched against the doctype public identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlVersion {
    Html401,
    Xhtml10,
    Xhtml11,
    Html5,
}

impl HtmlVersion {
    /// Detects the version from a doctype public identifier
    ///
    /// First match wins: "HTML 4.01", then "XHTML 1.0", then "XHTML 1.1".
    /// Anything else (including an empty identifier) is HTML5.
    pub fn from_public_id(public_id: &str) -> Self {
        if public_id.contains("HTML 4.01") {
            Self::Html401
        } else if public_id.contains("XHTML 1.0") {
            Self::Xhtml10
        } else if public_id.contains("XHTML 1.1") {
            Self::Xhtml11
        } else {
            Self::Html5
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Html401 => "HTML 4.01",
            Self::Xhtml10 => "XHTML 1.0",
            Self::Xhtml11 => "XHTML 1.1",
            Self::Html5 => "HTML5",
        }
    }
}

/// Number of `<h1>`..`<h6>` elements on a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadingCounts {
    #[serde(rename = "h1_count")]
    pub h1: u32,
    #[serde(rename = "h2_count")]
    pub h2: u32,
    #[serde(rename = "h3_count")]
    pub h3: u32,
    #[serde(rename = "h4_count")]
    pub h4: u32,
    #[serde(rename = "h5_count")]
    pub h5: u32,
    #[serde(rename = "h6_count")]
    pub h6: u32,
}

impl HeadingCounts {
    /// Counts one heading of the given level; levels outside 1..=6 are ignored
    pub fn record(&mut self, level: u8) {
        match level {
            1 => self.h1 += 1,
            2 => self.h2 += 1,
            3 => self.h3 += 1,
            4 => self.h4 += 1,
            5 => self.h5 += 1,
            6 => self.h6 += 1,
            _ => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.h1 + self.h2 + self.h3 + self.h4 + self.h5 + self.h6
    }
}

/// Structural metrics computed for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlMetrics {
    pub html_version: String,
    pub title: String,
    #[serde(flatten)]
    pub headings: HeadingCounts,
    pub internal_links: u32,
    pub external_links: u32,
    /// Subset of `external_links` whose probe failed
    pub broken_links: u32,
    pub has_login_form: bool,
}

impl Default for CrawlMetrics {
    fn default() -> Self {
        Self {
            html_version: HtmlVersion::Html5.label().to_string(),
            title: String::new(),
            headings: HeadingCounts::default(),
            internal_links: 0,
            external_links: 0,
            broken_links: 0,
            has_login_form: false,
        }
    }
}

/// Output of a single analysis pass
#[derive(Debug, Clone, PartialEq)]
pub struct PageAnalysis {
    /// Metrics with `broken_links` still zero
    pub metrics: CrawlMetrics,

    /// Targets of the anchors counted as external, one entry per anchor,
    /// resolved against the page URL where possible
    pub external_links: Vec<String>,
}

/// Analyzes a fetched document
///
/// # Arguments
///
/// * `body` - The raw response body
/// * `base_url` - The URL the document was fetched from
///
/// # Returns
///
/// * `Ok(PageAnalysis)` - Metrics and the external links to probe
/// * `Err(AnalyzerError::HtmlParse)` - The body is not valid UTF-8
pub fn analyze(body: &[u8], base_url: &Url) -> Result<PageAnalysis, AnalyzerError> {
    let html = std::str::from_utf8(body).map_err(|e| AnalyzerError::HtmlParse {
        url: base_url.to_string(),
        message: format!("document is not valid UTF-8: {}", e),
    })?;

    Ok(analyze_html(html, base_url))
}

/// Analyzes an HTML string
///
/// The HTML5 parser recovers from any malformed markup, so this never fails.
///
/// # Example
///
/// ```
/// use url::Url;
/// use url_analyzer::crawler::analyze_html;
///
/// let html = r#"<html><body><h1>Welcome</h1><a href="/about">About</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let analysis = analyze_html(html, &base);
/// assert_eq!(analysis.metrics.title, "Welcome");
/// assert_eq!(analysis.metrics.internal_links, 1);
/// ```
pub fn analyze_html(html: &str, base_url: &Url) -> PageAnalysis {
    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        tracing::debug!(
            "Recovered from {} parse errors in {}",
            document.errors.len(),
            base_url
        );
    }

    let mut metrics = CrawlMetrics::default();
    let mut external_links = Vec::new();
    let mut version = None;
    let mut title = None;
    let mut first_h1 = None;

    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Doctype(doctype) => {
                if version.is_none() {
                    version = Some(HtmlVersion::from_public_id(doctype.public_id()));
                }
            }
            Node::Element(element) => {
                let name = element.name();

                if let Some(level) = heading_level(name) {
                    metrics.headings.record(level);
                    if level == 1 && first_h1.is_none() {
                        first_h1 = ElementRef::wrap(node).map(element_text);
                    }
                    continue;
                }

                match name {
                    "title" if title.is_none() => {
                        title = ElementRef::wrap(node).map(element_text);
                    }
                    "a" => {
                        if let Some(href) = element.attr("href") {
                            match classify_link_with_base(base_url, href) {
                                LinkKind::Internal => metrics.internal_links += 1,
                                LinkKind::External => {
                                    metrics.external_links += 1;
                                    external_links.push(resolve_href(base_url, href));
                                }
                            }
                        }
                    }
                    "input" if !metrics.has_login_form => {
                        let is_password = element
                            .attr("type")
                            .is_some_and(|t| t.eq_ignore_ascii_case("password"));
                        if is_password && node.ancestors().any(|a| is_element(a.value(), "form"))
                        {
                            metrics.has_login_form = true;
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    metrics.html_version = version.unwrap_or(HtmlVersion::Html5).label().to_string();
    metrics.title = title
        .filter(|t| !t.is_empty())
        .or(first_h1)
        .unwrap_or_default();

    PageAnalysis {
        metrics,
        external_links,
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_element(node: &Node, name: &str) -> bool {
    matches!(node, Node::Element(element) if element.name() == name)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Makes an external href absolute so it can be probed
///
/// Hrefs that cannot be resolved are kept verbatim; their probe will fail and
/// they will be counted as broken.
fn resolve_href(base_url: &Url, href: &str) -> String {
    base_url
        .join(href.trim())
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
