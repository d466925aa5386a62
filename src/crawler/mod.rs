//! Crawl pipeline for a single request
//!
//! This module contains the per-request crawling logic, including:
//! - HTTP fetching of the target page
//! - HTML analysis (version, title, headings, links, login forms)
//! - Concurrent broken-link probing of external links
//! - The background worker that claims and processes queued requests

mod analyzer;
mod broken_links;
mod fetcher;
mod worker;

pub use analyzer::{analyze, analyze_html, CrawlMetrics, HeadingCounts, HtmlVersion, PageAnalysis};
pub use broken_links::{BrokenLinkChecker, HttpProber, LinkProber, ProbeOutcome};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use worker::{CycleOutcome, Worker, WorkerHandle};
