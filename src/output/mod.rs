//! Output module for presenting stored analysis data
//!
//! This module handles:
//! - Loading paginated pages of crawl results
//! - Rendering them as a table, JSON or markdown
//! - Collecting and rendering status statistics

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_results, format_markdown_statistics};
pub use stats::{format_statistics, load_statistics, print_statistics, AnalyzerStatistics};

use crate::storage::{CrawlResultRecord, Pagination, Storage, StorageError};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while producing output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Rendering used for result listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
}

/// One page of results with its pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct ResultsPage {
    pub data: Vec<CrawlResultRecord>,
    pub pagination: Pagination,
}

/// Loads a page of results, newest first
///
/// Out-of-range `page` and `page_size` values are normalized the same way
/// the store normalizes them.
pub fn load_results_page(storage: &dyn Storage, page: u32, page_size: u32) -> OutputResult<ResultsPage> {
    let (data, total) = storage.list_results(page, page_size)?;
    Ok(ResultsPage {
        data,
        pagination: Pagination::new(page, page_size, total),
    })
}

/// Renders a page of results in the requested format
pub fn render_results(page: &ResultsPage, format: OutputFormat) -> OutputResult<String> {
    match format {
        OutputFormat::Table => Ok(format_results_table(page)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
        OutputFormat::Markdown => Ok(format_markdown_results(page)),
    }
}

/// Formats a page of results as a fixed-width text table
pub fn format_results_table(page: &ResultsPage) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:>5}  {:<40}  {:<12}  {:>3}  {:>5}  {:>5}  {:>6}  {:>5}  {:>8}\n",
        "ID", "URL", "HTML", "H1", "INT", "EXT", "BROKEN", "LOGIN", "TIME(s)"
    ));

    for result in &page.data {
        let m = &result.metrics;
        out.push_str(&format!(
            "{:>5}  {:<40}  {:<12}  {:>3}  {:>5}  {:>5}  {:>6}  {:>5}  {:>8.3}\n",
            result.crawl_request_id,
            truncate(&result.url, 40),
            m.html_version,
            m.headings.h1,
            m.internal_links,
            m.external_links,
            m.broken_links,
            if m.has_login_form { "yes" } else { "no" },
            result.processing_time
        ));
    }

    let p = &page.pagination;
    out.push_str(&format!(
        "\nPage {}/{} · {} results{}{}\n",
        p.current_page,
        p.total_pages.max(1),
        p.total_items,
        if p.has_prev { " · prev" } else { "" },
        if p.has_next { " · next" } else { "" }
    ));

    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
