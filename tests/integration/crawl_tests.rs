//! Integration tests for the worker pipeline
//!
//! These tests run the worker against on-disk SQLite databases, stub
//! fetchers and wiremock servers, covering the full claim, analyze and
//! persist cycle end-to-end.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url_analyzer::config::{BrokenLinkConfig, Config, FetcherConfig, WorkerConfig};
use url_analyzer::crawler::{CycleOutcome, PageFetcher, Worker};
use url_analyzer::storage::{SqliteStorage, Storage};
use url_analyzer::{AnalyzerError, RequestStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Fixture Page</title></head>
<body>
  <h1>First</h1>
  <h1>Second</h1>
  <a href="/about">About</a>
  <a href="https://other.example.org/x">Elsewhere</a>
</body>
</html>"#;

/// Fetcher returning a fixed document and counting calls
struct FixtureFetcher {
    body: &'static str,
    calls: AtomicUsize,
}

impl FixtureFetcher {
    fn new(body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.as_bytes().to_vec())
    }
}

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval_secs: 1,
        shutdown_grace_secs: 2,
        processing_timeout_secs: 10,
        concurrency: 1,
    }
}

/// Opens a fresh database inside a temporary directory
fn temp_storage() -> (TempDir, Arc<SqliteStorage>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let storage = SqliteStorage::new(&dir.path().join("analyzer.db"))
        .expect("Failed to open database");
    (dir, Arc::new(storage))
}

/// Config pointing the reqwest-backed worker at short timeouts
fn http_config(db_path: &str, timeout_secs: u64) -> Config {
    Config {
        worker: worker_config(),
        fetcher: FetcherConfig {
            timeout_secs,
            user_agent: "url-analyzer-tests/1.0".to_string(),
            max_redirects: 5,
        },
        broken_links: BrokenLinkConfig {
            enabled: true,
            probe_timeout_secs: 2,
            max_concurrent_probes: 4,
        },
        storage: url_analyzer::config::StorageConfig {
            database_path: db_path.to_string(),
        },
    }
}

#[tokio::test]
async fn test_single_cycle_with_stub_fetcher() {
    let (_dir, storage) = temp_storage();
    let worker = Worker::new(
        storage.clone(),
        FixtureFetcher::new(FIXTURE),
        None,
        worker_config(),
    );

    let request = storage.create_request("https://example.com").unwrap();
    assert_eq!(request.status, RequestStatus::Queued);

    let outcome = worker.run_once().await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Completed { request_id, .. } if request_id == request.id));

    let request = storage.get_request(request.id).unwrap();
    assert_eq!(request.status, RequestStatus::Completed);

    let result = storage
        .get_result_for_request(request.id)
        .unwrap()
        .expect("Completed request should have a result");
    assert_eq!(result.metrics.html_version, "HTML5");
    assert_eq!(result.metrics.title, "Fixture Page");
    assert_eq!(result.metrics.headings.h1, 2);
    assert_eq!(result.metrics.internal_links, 1);
    assert_eq!(result.metrics.external_links, 1);
    assert!(result.metrics.broken_links <= result.metrics.external_links);
    assert!(!result.metrics.has_login_form);
    assert!(result.processing_time >= 0.0);

    // The queue is now empty
    assert!(matches!(
        worker.run_once().await.unwrap(),
        CycleOutcome::Idle
    ));
}

#[tokio::test]
async fn test_fetch_timeout_leaves_request_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FIXTURE)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let (dir, storage) = temp_storage();
    let db_path = dir.path().join("analyzer.db");
    let config = http_config(&db_path.to_string_lossy(), 1);
    let worker = Worker::from_config(&config, storage.clone()).unwrap();

    let request = storage
        .create_request(&format!("{}/slow", mock_server.uri()))
        .unwrap();

    let outcome = worker.run_once().await.unwrap();
    match outcome {
        CycleOutcome::Failed { request_id, error } => {
            assert_eq!(request_id, request.id);
            assert!(error.is_fetch_error(), "unexpected error: {}", error);
        }
        other => panic!("Expected failure, got {:?}", other),
    }

    assert_eq!(
        storage.get_request(request.id).unwrap().status,
        RequestStatus::Failed
    );
    assert!(storage.get_result_for_request(request.id).unwrap().is_none());

    let (results, total) = storage.list_results(1, 10).unwrap();
    assert!(results.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn test_non_success_status_fails_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let (dir, storage) = temp_storage();
    let config = http_config(&dir.path().join("analyzer.db").to_string_lossy(), 5);
    let worker = Worker::from_config(&config, storage.clone()).unwrap();

    let request = storage.create_request(&mock_server.uri()).unwrap();
    let outcome = worker.run_once().await.unwrap();

    assert!(matches!(
        outcome,
        CycleOutcome::Failed {
            error: AnalyzerError::UnexpectedStatus { code: 500, .. },
            ..
        }
    ));
    assert_eq!(
        storage.get_request(request.id).unwrap().status,
        RequestStatus::Failed
    );
}

#[tokio::test]
async fn test_full_http_cycle_counts_broken_links() {
    let mock_server = MockServer::start().await;
    let port = url::Url::parse(&mock_server.uri())
        .expect("Failed to parse base URL")
        .port()
        .expect("Mock server should have a port");

    // `localhost` differs from the page host `127.0.0.1`, so these links are
    // external while still resolving to the mock server.
    let page = format!(
        r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">
<html>
<head><title>Sign in</title></head>
<body>
  <h1>Welcome</h1>
  <h2>Account</h2>
  <a href="/home">Home</a>
  <a href="contact.html">Contact</a>
  <a href="http://localhost:{port}/alive">Alive</a>
  <a href="http://localhost:{port}/missing">Missing</a>
  <a href="http://localhost:{port}/missing">Missing again</a>
  <form action="/login" method="post">
    <input type="text" name="user">
    <input type="Password" name="pass">
  </form>
</body>
</html>"#
    );

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/alive"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (dir, storage) = temp_storage();
    let config = http_config(&dir.path().join("analyzer.db").to_string_lossy(), 5);
    let worker = Worker::from_config(&config, storage.clone()).unwrap();

    let request = storage
        .create_request(&format!("{}/page", mock_server.uri()))
        .unwrap();

    let outcome = worker.run_once().await.unwrap();
    assert!(
        matches!(outcome, CycleOutcome::Completed { .. }),
        "unexpected outcome: {:?}",
        outcome
    );

    let result = storage.get_result_for_request(request.id).unwrap().unwrap();
    assert_eq!(result.metrics.html_version, "HTML 4.01");
    assert_eq!(result.metrics.title, "Sign in");
    assert_eq!(result.metrics.headings.h1, 1);
    assert_eq!(result.metrics.headings.h2, 1);
    assert_eq!(result.metrics.internal_links, 2);
    assert_eq!(result.metrics.external_links, 3);
    assert_eq!(result.metrics.broken_links, 2);
    assert!(result.metrics.has_login_form);

    assert_eq!(
        storage.get_request(request.id).unwrap().status,
        RequestStatus::Completed
    );
}

#[test]
fn test_concurrent_claims_across_connections() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("analyzer.db");

    let seed = SqliteStorage::new(&db_path).unwrap();
    let request = seed.create_request("https://example.com").unwrap();

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let db_path = db_path.clone();
            std::thread::spawn(move || {
                let storage = SqliteStorage::new(&db_path).unwrap();
                storage.claim_next_queued().unwrap()
            })
        })
        .collect();

    let claims: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = claims.iter().flatten().collect();

    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].id, request.id);
    assert_eq!(winners[0].status, RequestStatus::Processing);
    assert_eq!(claims.iter().filter(|c| c.is_none()).count(), 1);
    assert_eq!(
        seed.count_requests_by_status(RequestStatus::Processing)
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_parallel_poll_loops_process_each_request_once() {
    let (_dir, storage) = temp_storage();
    let fetcher = FixtureFetcher::new(FIXTURE);
    let config = WorkerConfig {
        concurrency: 3,
        ..worker_config()
    };
    let worker = Worker::new(storage.clone(), fetcher.clone(), None, config);

    let ids: Vec<i64> = (0..6)
        .map(|i| {
            storage
                .create_request(&format!("https://example.com/{}", i))
                .unwrap()
                .id
        })
        .collect();

    let handle = worker.spawn(CancellationToken::new());

    let mut remaining = ids.len() as u64;
    for _ in 0..100 {
        remaining = storage
            .count_requests_by_status(RequestStatus::Queued)
            .unwrap()
            + storage
                .count_requests_by_status(RequestStatus::Processing)
                .unwrap();
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(remaining, 0, "requests were left unprocessed");

    assert!(handle.shutdown(Duration::from_secs(2)).await);

    for id in &ids {
        assert_eq!(
            storage.get_request(*id).unwrap().status,
            RequestStatus::Completed
        );
    }
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), ids.len());

    let (_, total) = storage.list_results(1, 100).unwrap();
    assert_eq!(total, ids.len() as u64);
}
