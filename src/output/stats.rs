//! Statistics generation from the analyzer database
//!
//! This module provides functionality for extracting and displaying
//! request and result statistics from the storage layer.

use crate::state::RequestStatus;
use crate::storage::{ResultTotals, Storage, StorageResult};
use serde::Serialize;
use std::collections::HashMap;

/// Analyzer statistics summary
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzerStatistics {
    /// Total number of crawl requests ever submitted
    pub total_requests: u64,

    /// Count of requests by status
    pub requests_by_status: HashMap<RequestStatus, u64>,

    /// Aggregates over stored results
    pub results: ResultTotals,
}

impl AnalyzerStatistics {
    pub fn count(&self, status: RequestStatus) -> u64 {
        self.requests_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Share of finished requests that completed, in percent
    pub fn success_rate(&self) -> f64 {
        let completed = self.count(RequestStatus::Completed);
        let finished = completed + self.count(RequestStatus::Failed);
        if finished == 0 {
            0.0
        } else {
            completed as f64 / finished as f64 * 100.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(AnalyzerStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<AnalyzerStatistics> {
    let mut requests_by_status = HashMap::new();
    for status in RequestStatus::all() {
        let count = storage.count_requests_by_status(status)?;
        requests_by_status.insert(status, count);
    }

    Ok(AnalyzerStatistics {
        total_requests: requests_by_status.values().sum(),
        requests_by_status,
        results: storage.summarize_results()?,
    })
}

/// Formats statistics as plain text
pub fn format_statistics(stats: &AnalyzerStatistics) -> String {
    let mut out = String::new();

    out.push_str("=== URL Analyzer Statistics ===\n\n");

    out.push_str("Requests by Status:\n");
    for status in RequestStatus::all() {
        let count = stats.count(status);
        let percentage = if stats.total_requests > 0 {
            (count as f64 / stats.total_requests as f64) * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "  {:<11} {} ({:.1}%)\n",
            status, count, percentage
        ));
    }
    out.push_str(&format!("  {:<11} {}\n\n", "total", stats.total_requests));

    out.push_str("Results:\n");
    out.push_str(&format!("  Stored results: {}\n", stats.results.results));
    out.push_str(&format!(
        "  Average processing time: {:.3}s\n",
        stats.results.average_processing_time
    ));
    out.push_str(&format!(
        "  Broken links found: {}\n",
        stats.results.broken_links
    ));
    out.push_str(&format!(
        "  Pages with login forms: {}\n\n",
        stats.results.login_forms
    ));

    out.push_str(&format!("Success Rate: {:.1}%\n", stats.success_rate()));

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &AnalyzerStatistics) {
    print!("{}", format_statistics(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewCrawlResult, SqliteStorage};

    #[test]
    fn test_load_statistics_counts_each_status() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let done = storage.create_request("https://example.com/a").unwrap();
        storage.create_request("https://example.com/b").unwrap();
        storage.create_request("https://example.com/c").unwrap();

        storage.claim_next_queued().unwrap();
        storage.save_result(&NewCrawlResult {
            crawl_request_id: done.id,
            metrics: Default::default(),
            processing_time: 0.5,
        })
        .unwrap();
        storage
            .update_status(done.id, RequestStatus::Completed)
            .unwrap();
        let failed = storage.claim_next_queued().unwrap().unwrap();
        storage
            .update_status(failed.id, RequestStatus::Failed)
            .unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.count(RequestStatus::Queued), 1);
        assert_eq!(stats.count(RequestStatus::Processing), 0);
        assert_eq!(stats.count(RequestStatus::Completed), 1);
        assert_eq!(stats.count(RequestStatus::Failed), 1);
        assert_eq!(stats.results.results, 1);
        assert_eq!(stats.success_rate(), 50.0);
    }

    #[test]
    fn test_success_rate_without_finished_requests() {
        let stats = AnalyzerStatistics {
            total_requests: 2,
            requests_by_status: HashMap::from([(RequestStatus::Queued, 2)]),
            results: ResultTotals::default(),
        };
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_format_statistics() {
        let stats = AnalyzerStatistics {
            total_requests: 4,
            requests_by_status: HashMap::from([
                (RequestStatus::Completed, 3),
                (RequestStatus::Failed, 1),
            ]),
            results: ResultTotals {
                results: 3,
                average_processing_time: 1.25,
                broken_links: 7,
                login_forms: 1,
            },
        };

        let text = format_statistics(&stats);
        assert!(text.contains("completed   3 (75.0%)"));
        assert!(text.contains("Broken links found: 7"));
        assert!(text.contains("Average processing time: 1.250s"));
        assert!(text.contains("Success Rate: 75.0%"));
    }

    #[test]
    fn test_format_statistics_layout() {
        let stats = AnalyzerStatistics {
            total_requests: 0,
            requests_by_status: HashMap::new(),
            results: ResultTotals::default(),
        };

        let text = format_statistics(&stats);
        assert!(text.starts_with("=== URL Analyzer Statistics ===\n\nRequests by Status:\n"));
        assert!(text.contains("  queued      0 (0.0%)\n"));
        assert!(text.contains("  total       0\n\nResults:\n"));
        assert!(text.contains("  Pages with login forms: 0\n\nSuccess Rate"));
        assert!(text.ends_with("Success Rate: 0.0%\n"));
    }
}
