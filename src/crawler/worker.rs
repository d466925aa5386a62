//! Background worker - claims queued requests and drives them to a terminal state
//!
//! Each poll loop wakes on a fixed interval, claims at most one request
//! through the store's atomic claim and runs the full pipeline for it:
//! fetch, analyze, broken-link check, persist. Failures end the attempt in
//! `Failed` and never stop the loop.
//!
//! Shutdown is cooperative. Cancelling the token stops loops from starting new
//! cycles; a cycle already in flight runs to completion unless the grace
//! period passed to [`WorkerHandle::shutdown`] expires first, in which case
//! the loop is aborted and its request is left in `Processing`.

use crate::config::{Config, WorkerConfig};
use crate::crawler::analyzer::{analyze, CrawlMetrics, PageAnalysis};
use crate::crawler::broken_links::{BrokenLinkChecker, HttpProber};
use crate::crawler::fetcher::{build_http_client, HttpFetcher, PageFetcher};
use crate::state::RequestStatus;
use crate::storage::{CrawlRequestRecord, NewCrawlResult, Storage};
use crate::url::validate_target_url;
use crate::{AnalyzerError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// What a single claim-and-process cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing was queued
    Idle,

    /// The request was analyzed and its result persisted
    Completed { request_id: i64, result_id: i64 },

    /// The request was moved to `Failed`
    Failed {
        request_id: i64,
        error: AnalyzerError,
    },
}

/// Crawl orchestrator
///
/// Cloning is cheap; all clones share the same store, fetcher and checker.
#[derive(Clone)]
pub struct Worker {
    storage: Arc<dyn Storage>,
    fetcher: Arc<dyn PageFetcher>,
    checker: Option<BrokenLinkChecker>,
    config: WorkerConfig,
}

impl Worker {
    /// Creates a worker from explicit parts
    ///
    /// Passing `None` as the checker disables broken-link probing; every
    /// result is then stored with a broken count of zero.
    pub fn new(
        storage: Arc<dyn Storage>,
        fetcher: Arc<dyn PageFetcher>,
        checker: Option<BrokenLinkChecker>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            storage,
            fetcher,
            checker,
            config,
        }
    }

    /// Creates a worker using the reqwest-backed fetcher and prober
    ///
    /// # Returns
    ///
    /// * `Ok(Worker)` - Ready to run
    /// * `Err(AnalyzerError::Http)` - The HTTP client could not be built
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let client = build_http_client(&config.fetcher)?;

        let checker = if config.broken_links.enabled {
            Some(BrokenLinkChecker::new(
                Arc::new(HttpProber::new(client.clone())),
                config.broken_links.max_concurrent_probes,
                config.broken_links.probe_timeout(),
            ))
        } else {
            None
        };

        Ok(Self::new(
            storage,
            Arc::new(HttpFetcher::new(client)),
            checker,
            config.worker.clone(),
        ))
    }

    /// Runs one claim-and-process cycle
    ///
    /// # Returns
    ///
    /// * `Ok(CycleOutcome)` - Whatever happened to the claimed request, if any
    /// * `Err(AnalyzerError)` - The claim itself failed; no request changed state
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        let request = match self.storage.claim_next_queued()? {
            Some(request) => request,
            None => {
                tracing::debug!("No queued requests");
                return Ok(CycleOutcome::Idle);
            }
        };

        tracing::info!("Claimed request {} for {}", request.id, request.url);
        Ok(self.process_request(&request).await)
    }

    /// Processes a request that is already in `Processing`
    async fn process_request(&self, request: &CrawlRequestRecord) -> CycleOutcome {
        let started = Instant::now();
        let budget = self.config.processing_timeout();

        let metrics = match tokio::time::timeout(budget, self.analyze_url(&request.url)).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(e)) => return self.fail(request, e),
            Err(_) => {
                return self.fail(
                    request,
                    AnalyzerError::ProcessingTimeout {
                        url: request.url.clone(),
                        seconds: budget.as_secs(),
                    },
                )
            }
        };

        let result = NewCrawlResult {
            crawl_request_id: request.id,
            metrics,
            processing_time: started.elapsed().as_secs_f64(),
        };

        match self.persist(&result) {
            Ok(result_id) => {
                tracing::info!(
                    "Completed request {} for {} in {:.3}s ({} broken links)",
                    request.id,
                    request.url,
                    result.processing_time,
                    result.metrics.broken_links
                );
                CycleOutcome::Completed {
                    request_id: request.id,
                    result_id,
                }
            }
            Err(e) => self.fail(request, e),
        }
    }

    /// Fetch, analyze and probe a single URL
    async fn analyze_url(&self, url: &str) -> Result<CrawlMetrics> {
        let base = validate_target_url(url)?;
        let body = self.fetcher.fetch(url).await?;

        let PageAnalysis {
            mut metrics,
            external_links,
        } = analyze(&body, &base)?;

        if let Some(checker) = &self.checker {
            metrics.broken_links = checker.count_broken(&external_links).await;
        }

        Ok(metrics)
    }

    fn persist(&self, result: &NewCrawlResult) -> Result<i64> {
        Ok(self.storage.complete_request(result)?)
    }

    fn fail(&self, request: &CrawlRequestRecord, error: AnalyzerError) -> CycleOutcome {
        tracing::error!("Request {} for {} failed: {}", request.id, request.url, error);

        if let Err(e) = self
            .storage
            .update_status(request.id, RequestStatus::Failed)
        {
            tracing::error!("Could not mark request {} as failed: {}", request.id, e);
        }

        CycleOutcome::Failed {
            request_id: request.id,
            error,
        }
    }

    /// Starts the poll loops in the background
    ///
    /// One loop is spawned per configured unit of concurrency. Cancelling
    /// `token` (or calling [`WorkerHandle::shutdown`]) stops them.
    pub fn spawn(self, token: CancellationToken) -> WorkerHandle {
        let loops = self.config.concurrency.max(1);
        let mut tasks = JoinSet::new();

        for index in 0..loops {
            let worker = self.clone();
            let token = token.clone();
            tasks.spawn(async move { worker.poll_loop(index, token).await });
        }

        tracing::info!(
            "Worker started with {} poll loop(s), interval {}s",
            loops,
            self.config.poll_interval_secs
        );

        WorkerHandle { token, tasks }
    }

    async fn poll_loop(self, index: u32, token: CancellationToken) {
        let period = self.config.poll_interval().max(Duration::from_millis(10));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.run_once().await {
                tracing::error!("Poll loop {}: claim failed: {}", index, e);
            }
        }

        tracing::debug!("Poll loop {} stopped", index);
    }
}

/// Handle to running poll loops
pub struct WorkerHandle {
    token: CancellationToken,
    tasks: JoinSet<()>,
}

impl WorkerHandle {
    /// Token observed by the poll loops
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stops the loops and waits up to `grace` for in-flight cycles
    ///
    /// # Returns
    ///
    /// `true` if every loop stopped on its own, `false` if some had to be
    /// aborted. Requests held by aborted loops remain in `Processing`.
    pub async fn shutdown(mut self, grace: Duration) -> bool {
        self.token.cancel();

        let drained = tokio::time::timeout(grace, join_all(&mut self.tasks))
            .await
            .is_ok();

        if !drained {
            tracing::warn!(
                "Grace period of {}s elapsed, abandoning in-flight requests",
                grace.as_secs()
            );
            self.tasks.abort_all();
            join_all(&mut self.tasks).await;
        }

        drained
    }

    /// Waits for the loops to stop without cancelling them
    pub async fn wait(mut self) {
        join_all(&mut self.tasks).await;
    }
}

async fn join_all(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!("Poll loop panicked: {}", e);
            }
        }
    }
}
