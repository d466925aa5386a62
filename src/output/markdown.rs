//! Markdown report generation
//!
//! This module renders pages of crawl results and the status statistics as
//! human-readable markdown.

use crate::output::stats::AnalyzerStatistics;
use crate::output::ResultsPage;
use crate::state::RequestStatus;

/// Formats one page of results as a markdown report
pub fn format_markdown_results(page: &ResultsPage) -> String {
    let mut md = String::new();
    let pagination = &page.pagination;

    md.push_str("# URL Analysis Results\n\n");
    md.push_str(&format!(
        "Page {} of {} ({} results total)\n\n",
        pagination.current_page,
        pagination.total_pages.max(1),
        pagination.total_items
    ));

    if page.data.is_empty() {
        md.push_str("_No results._\n");
        return md;
    }

    md.push_str("| URL | Title | HTML | H1-H6 | Internal | External | Broken | Login Form | Time (s) |\n");
    md.push_str("|-----|-------|------|-------|----------|----------|--------|------------|----------|\n");

    for result in &page.data {
        let m = &result.metrics;
        let h = &m.headings;
        md.push_str(&format!(
            "| {} | {} | {} | {}/{}/{}/{}/{}/{} | {} | {} | {} | {} | {:.3} |\n",
            escape_cell(&result.url),
            escape_cell(&m.title),
            m.html_version,
            h.h1,
            h.h2,
            h.h3,
            h.h4,
            h.h5,
            h.h6,
            m.internal_links,
            m.external_links,
            m.broken_links,
            if m.has_login_form { "yes" } else { "no" },
            result.processing_time
        ));
    }

    if pagination.has_next {
        md.push_str(&format!(
            "\nNext page: `--page {}`\n",
            pagination.current_page + 1
        ));
    }

    md
}

/// Formats statistics as a markdown summary
pub fn format_markdown_statistics(stats: &AnalyzerStatistics) -> String {
    let mut md = String::new();

    md.push_str("# URL Analyzer Summary\n\n");

    md.push_str("## Requests\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    for status in RequestStatus::all() {
        md.push_str(&format!("| {} | {} |\n", status, stats.count(status)));
    }
    md.push_str(&format!("| **total** | {} |\n\n", stats.total_requests));

    md.push_str("## Results\n\n");
    md.push_str(&format!("- **Stored Results**: {}\n", stats.results.results));
    md.push_str(&format!(
        "- **Average Processing Time**: {:.3}s\n",
        stats.results.average_processing_time
    ));
    md.push_str(&format!(
        "- **Broken Links**: {}\n",
        stats.results.broken_links
    ));
    md.push_str(&format!(
        "- **Pages With Login Forms**: {}\n",
        stats.results.login_forms
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        stats.success_rate()
    ));

    md
}

/// Keeps pipes and newlines from breaking a table row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlMetrics, HeadingCounts};
    use crate::storage::{CrawlResultRecord, Pagination, ResultTotals};
    use chrono::Utc;
    use std::collections::HashMap;

    fn create_test_page() -> ResultsPage {
        ResultsPage {
            data: vec![CrawlResultRecord {
                id: 1,
                crawl_request_id: 7,
                url: "https://example.com/".to_string(),
                metrics: CrawlMetrics {
                    title: "Example | Home".to_string(),
                    headings: HeadingCounts {
                        h1: 2,
                        ..HeadingCounts::default()
                    },
                    internal_links: 4,
                    external_links: 3,
                    broken_links: 1,
                    has_login_form: true,
                    ..CrawlMetrics::default()
                },
                processing_time: 0.5,
                created_at: Utc::now(),
            }],
            pagination: Pagination::new(1, 1, 2),
        }
    }

    #[test]
    fn test_format_markdown_results() {
        let markdown = format_markdown_results(&create_test_page());

        assert!(markdown.contains("# URL Analysis Results"));
        assert!(markdown.contains("Page 1 of 2 (2 results total)"));
        assert!(markdown.contains("| https://example.com/ | Example \\| Home | HTML5 | 2/0/0/0/0/0 | 4 | 3 | 1 | yes | 0.500 |"));
        assert!(markdown.contains("--page 2"));
    }

    #[test]
    fn test_format_markdown_results_empty() {
        let page = ResultsPage {
            data: vec![],
            pagination: Pagination::new(1, 10, 0),
        };
        let markdown = format_markdown_results(&page);
        assert!(markdown.contains("Page 1 of 1 (0 results total)"));
        assert!(markdown.contains("_No results._"));
    }

    #[test]
    fn test_format_markdown_statistics() {
        let stats = AnalyzerStatistics {
            total_requests: 3,
            requests_by_status: HashMap::from([
                (RequestStatus::Completed, 2),
                (RequestStatus::Queued, 1),
            ]),
            results: ResultTotals {
                results: 2,
                average_processing_time: 0.75,
                broken_links: 5,
                login_forms: 0,
            },
        };

        let markdown = format_markdown_statistics(&stats);
        assert!(markdown.contains("| completed | 2 |"));
        assert!(markdown.contains("| failed | 0 |"));
        assert!(markdown.contains("| **total** | 3 |"));
        assert!(markdown.contains("**Broken Links**: 5"));
        assert!(markdown.contains("**Success Rate**: 100.00%"));
    }
}
