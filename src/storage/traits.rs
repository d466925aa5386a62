//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::RequestStatus;
use crate::storage::{CrawlRequestRecord, CrawlResultRecord, NewCrawlResult, ResultTotals};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Crawl request not found: {0}")]
    RequestNotFound(i64),

    #[error("Invalid status transition for request {id}: {from} -> {to}")]
    InvalidTransition {
        id: i64,
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The worker and the read path share one store, possibly across tasks, so
/// every operation takes `&self` and implementations must be thread-safe.
pub trait Storage: Send + Sync {
    // ===== Request Lifecycle =====

    /// Creates a new crawl request in the Queued state
    fn create_request(&self, url: &str) -> StorageResult<CrawlRequestRecord>;

    /// Gets a crawl request by ID
    fn get_request(&self, id: i64) -> StorageResult<CrawlRequestRecord>;

    /// Atomically selects the oldest Queued request and marks it Processing
    ///
    /// Returns `Ok(None)` when nothing is queued. Two concurrent callers never
    /// receive the same request.
    fn claim_next_queued(&self) -> StorageResult<Option<CrawlRequestRecord>>;

    /// Writes a request status
    ///
    /// Writing the current status again is a no-op. Moves that the request
    /// lifecycle forbids fail with [`StorageError::InvalidTransition`].
    fn update_status(&self, id: i64, status: RequestStatus) -> StorageResult<()>;

    /// Counts requests in a given status
    fn count_requests_by_status(&self, status: RequestStatus) -> StorageResult<u64>;

    // ===== Results =====

    /// Inserts a crawl result in a single transaction
    ///
    /// # Returns
    ///
    /// The ID of the newly inserted result
    fn save_result(&self, result: &NewCrawlResult) -> StorageResult<i64>;

    /// Moves a `Processing` request to `Completed` and inserts its result
    ///
    /// Both writes happen in one transaction. If the request is no longer
    /// `Processing` nothing is written and [`StorageError::InvalidTransition`]
    /// is returned.
    ///
    /// # Returns
    ///
    /// The ID of the newly inserted result
    fn complete_request(&self, result: &NewCrawlResult) -> StorageResult<i64>;

    /// Gets the most recent result recorded for a request
    fn get_result_for_request(&self, request_id: i64)
        -> StorageResult<Option<CrawlResultRecord>>;

    /// Lists results newest first
    ///
    /// `page` and `page_size` are normalized with [`crate::storage::normalize_page`].
    ///
    /// # Returns
    ///
    /// The requested page of results and the total number of results
    fn list_results(
        &self,
        page: u32,
        page_size: u32,
    ) -> StorageResult<(Vec<CrawlResultRecord>, u64)>;

    /// Aggregates over every stored result
    fn summarize_results(&self) -> StorageResult<ResultTotals>;
}
