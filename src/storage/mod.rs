//! Storage module for persisting crawl requests and results
//!
//! This module is the Request Store the worker talks to:
//! - SQLite database initialization and schema management
//! - Crawl request lifecycle persistence, including the atomic claim
//! - Single-shot crawl result inserts
//! - The paginated read path used by front ends

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::CrawlMetrics;
use crate::state::RequestStatus;
use crate::AnalyzerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Page number used when none (or an invalid one) is given
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when none (or an out-of-range one) is given
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Opens (or creates) a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(AnalyzerError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, AnalyzerError> {
    Ok(SqliteStorage::new(path)?)
}

/// A crawl request as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRequestRecord {
    pub id: i64,
    pub url: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A crawl result ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrawlResult {
    pub crawl_request_id: i64,
    pub metrics: CrawlMetrics,
    /// Seconds spent fetching and analyzing the page
    pub processing_time: f64,
}

/// A persisted crawl result, joined with the URL of its request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlResultRecord {
    pub id: i64,
    pub crawl_request_id: i64,
    pub url: String,
    #[serde(flatten)]
    pub metrics: CrawlMetrics,
    pub processing_time: f64,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over all stored results
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResultTotals {
    pub results: u64,
    /// Mean processing time in seconds, zero when there are no results
    pub average_processing_time: f64,
    pub broken_links: u64,
    pub login_forms: u64,
}

/// Normalizes a requested page and page size
///
/// Pages below 1 become [`DEFAULT_PAGE`]; sizes outside `1..=MAX_PAGE_SIZE`
/// become [`DEFAULT_PAGE_SIZE`].
pub fn normalize_page(page: u32, page_size: u32) -> (u32, u32) {
    let page = if page < 1 { DEFAULT_PAGE } else { page };
    let page_size = if page_size < 1 || page_size > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    (page, page_size)
}

/// Pagination metadata for one page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Builds pagination metadata from normalized page values and a total count
    pub fn new(page: u32, page_size: u32, total_items: u64) -> Self {
        let (page, page_size) = normalize_page(page, page_size);
        let total_pages = total_items.div_ceil(u64::from(page_size));
        Self {
            current_page: page,
            page_size,
            total_items,
            total_pages,
            has_next: u64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}
