//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the URL Analyzer database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Submitted URLs and their lifecycle status
CREATE TABLE IF NOT EXISTS crawl_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_requests_status ON crawl_requests(status);

-- Metrics for each successfully analyzed page
CREATE TABLE IF NOT EXISTS crawl_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawl_request_id INTEGER NOT NULL REFERENCES crawl_requests(id),
    html_version TEXT NOT NULL,
    title TEXT NOT NULL,
    h1_count INTEGER NOT NULL DEFAULT 0,
    h2_count INTEGER NOT NULL DEFAULT 0,
    h3_count INTEGER NOT NULL DEFAULT 0,
    h4_count INTEGER NOT NULL DEFAULT 0,
    h5_count INTEGER NOT NULL DEFAULT 0,
    h6_count INTEGER NOT NULL DEFAULT 0,
    internal_links INTEGER NOT NULL DEFAULT 0,
    external_links INTEGER NOT NULL DEFAULT 0,
    broken_links INTEGER NOT NULL DEFAULT 0,
    has_login_form INTEGER NOT NULL DEFAULT 0,
    processing_time REAL NOT NULL,
    created_at TEXT NOT NULL,
    CHECK (broken_links <= external_links)
);

CREATE INDEX IF NOT EXISTS idx_crawl_results_request ON crawl_results(crawl_request_id);
CREATE INDEX IF NOT EXISTS idx_crawl_results_created ON crawl_results(created_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
