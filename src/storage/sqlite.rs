//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::{CrawlMetrics, HeadingCounts};
use crate::state::RequestStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    normalize_page, CrawlRequestRecord, CrawlResultRecord, NewCrawlResult, ResultTotals,
};
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const REQUEST_COLUMNS: &str = "id, url, status, created_at, updated_at";

const RESULT_COLUMNS: &str = "r.id, r.crawl_request_id, q.url, r.html_version, r.title,
     r.h1_count, r.h2_count, r.h3_count, r.h4_count, r.h5_count, r.h6_count,
     r.internal_links, r.external_links, r.broken_links, r.has_login_form,
     r.processing_time, r.created_at";

impl ToSql for RequestStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_db_string()))
    }
}

impl FromSql for RequestStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        RequestStatus::from_db_string(s).ok_or(FromSqlError::InvalidType)
    }
}

/// SQLite storage backend
///
/// The connection sits behind a mutex so one store can be shared by the
/// worker's poll loops and the read path.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA busy_timeout = 5000;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn request_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlRequestRecord> {
    Ok(CrawlRequestRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn result_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlResultRecord> {
    Ok(CrawlResultRecord {
        id: row.get(0)?,
        crawl_request_id: row.get(1)?,
        url: row.get(2)?,
        metrics: CrawlMetrics {
            html_version: row.get(3)?,
            title: row.get(4)?,
            headings: HeadingCounts {
                h1: row.get(5)?,
                h2: row.get(6)?,
                h3: row.get(7)?,
                h4: row.get(8)?,
                h5: row.get(9)?,
                h6: row.get(10)?,
            },
            internal_links: row.get(11)?,
            external_links: row.get(12)?,
            broken_links: row.get(13)?,
            has_login_form: row.get(14)?,
        },
        processing_time: row.get(15)?,
        created_at: row.get(16)?,
    })
}

fn select_request(conn: &Connection, id: i64) -> StorageResult<CrawlRequestRecord> {
    conn.query_row(
        &format!("SELECT {} FROM crawl_requests WHERE id = ?1", REQUEST_COLUMNS),
        params![id],
        request_from_row,
    )
    .optional()?
    .ok_or(StorageError::RequestNotFound(id))
}

fn insert_result(conn: &Connection, result: &NewCrawlResult) -> StorageResult<i64> {
    let metrics = &result.metrics;
    let headings = &metrics.headings;

    conn.execute(
        "INSERT INTO crawl_results (crawl_request_id, html_version, title,
         h1_count, h2_count, h3_count, h4_count, h5_count, h6_count,
         internal_links, external_links, broken_links, has_login_form,
         processing_time, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            result.crawl_request_id,
            metrics.html_version,
            metrics.title,
            headings.h1,
            headings.h2,
            headings.h3,
            headings.h4,
            headings.h5,
            headings.h6,
            metrics.internal_links,
            metrics.external_links,
            metrics.broken_links,
            metrics.has_login_form,
            result.processing_time,
            Utc::now(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Storage for SqliteStorage {
    // ===== Request Lifecycle =====

    fn create_request(&self, url: &str) -> StorageResult<CrawlRequestRecord> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO crawl_requests (url, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![url, RequestStatus::Queued, now],
        )?;
        let id = conn.last_insert_rowid();
        select_request(&conn, id)
    }

    fn get_request(&self, id: i64) -> StorageResult<CrawlRequestRecord> {
        let conn = self.lock()?;
        select_request(&conn, id)
    }

    fn claim_next_queued(&self) -> StorageResult<Option<CrawlRequestRecord>> {
        let mut conn = self.lock()?;

        // IMMEDIATE takes the write lock up front, so other connections to the
        // same file cannot pick the same row between our SELECT and UPDATE.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidate: Option<i64> = tx
            .query_row(
                "SELECT id FROM crawl_requests WHERE status = ?1 ORDER BY id LIMIT 1",
                params![RequestStatus::Queued],
                |row| row.get(0),
            )
            .optional()?;

        let Some(id) = candidate else {
            tx.commit()?;
            return Ok(None);
        };

        let changed = tx.execute(
            "UPDATE crawl_requests SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                RequestStatus::Processing,
                Utc::now(),
                id,
                RequestStatus::Queued
            ],
        )?;

        if changed == 0 {
            tx.commit()?;
            return Ok(None);
        }

        let claimed = select_request(&tx, id)?;
        tx.commit()?;
        Ok(Some(claimed))
    }

    fn update_status(&self, id: i64, status: RequestStatus) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = select_request(&tx, id)?.status;
        if current == status {
            tx.commit()?;
            return Ok(());
        }
        if !current.can_transition_to(status) {
            return Err(StorageError::InvalidTransition {
                id,
                from: current,
                to: status,
            });
        }

        tx.execute(
            "UPDATE crawl_requests SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Utc::now(), id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn count_requests_by_status(&self, status: RequestStatus) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM crawl_requests WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Results =====

    fn save_result(&self, result: &NewCrawlResult) -> StorageResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = insert_result(&tx, result)?;
        tx.commit()?;
        Ok(id)
    }

    fn complete_request(&self, result: &NewCrawlResult) -> StorageResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = result.crawl_request_id;

        let changed = tx.execute(
            "UPDATE crawl_requests SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                RequestStatus::Completed,
                Utc::now(),
                id,
                RequestStatus::Processing
            ],
        )?;

        if changed == 0 {
            // Dropping the transaction rolls it back
            let current = select_request(&tx, id)?.status;
            return Err(StorageError::InvalidTransition {
                id,
                from: current,
                to: RequestStatus::Completed,
            });
        }

        let result_id = insert_result(&tx, result)?;
        tx.commit()?;
        Ok(result_id)
    }

    fn get_result_for_request(
        &self,
        request_id: i64,
    ) -> StorageResult<Option<CrawlResultRecord>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM crawl_results r
                     JOIN crawl_requests q ON q.id = r.crawl_request_id
                     WHERE r.crawl_request_id = ?1
                     ORDER BY r.id DESC LIMIT 1",
                    RESULT_COLUMNS
                ),
                params![request_id],
                result_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn list_results(
        &self,
        page: u32,
        page_size: u32,
    ) -> StorageResult<(Vec<CrawlResultRecord>, u64)> {
        let (page, page_size) = normalize_page(page, page_size);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let conn = self.lock()?;
        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM crawl_results", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM crawl_results r
             JOIN crawl_requests q ON q.id = r.crawl_request_id
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?1 OFFSET ?2",
            RESULT_COLUMNS
        ))?;

        let results = stmt
            .query_map(params![i64::from(page_size), offset], result_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((results, total as u64))
    }

    fn summarize_results(&self) -> StorageResult<ResultTotals> {
        let conn = self.lock()?;
        let totals = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(AVG(processing_time), 0.0),
                    COALESCE(SUM(broken_links), 0),
                    COALESCE(SUM(has_login_form), 0)
             FROM crawl_results",
            [],
            |row| {
                Ok(ResultTotals {
                    results: row.get::<_, i64>(0)? as u64,
                    average_processing_time: row.get(1)?,
                    broken_links: row.get::<_, i64>(2)? as u64,
                    login_forms: row.get::<_, i64>(3)? as u64,
                })
            },
        )?;
        Ok(totals)
    }
}
