//! Broken-link checking for external links
//!
//! Each distinct external target gets one lightweight HEAD probe. A transport
//! error, a probe timeout, or a status of 400 or above marks the target as
//! broken; every anchor pointing at a broken target adds to the count.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Result of probing a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered below 400 (redirects are followed by the client)
    Reachable { status: u16 },

    /// The server answered with 400 or above
    ErrorStatus { status: u16 },

    /// No usable answer (DNS, TLS, connection, timeout, malformed URL)
    Unreachable { reason: String },
}

impl ProbeOutcome {
    pub fn is_broken(&self) -> bool {
        !matches!(self, Self::Reachable { .. })
    }
}

/// Checks whether a link target exists
#[async_trait]
pub trait LinkProber: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// `LinkProber` issuing HEAD requests through reqwest
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkProber for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if status >= 400 {
                    ProbeOutcome::ErrorStatus { status }
                } else {
                    ProbeOutcome::Reachable { status }
                }
            }
            Err(e) => ProbeOutcome::Unreachable {
                reason: e.to_string(),
            },
        }
    }
}

/// Counts broken links among a page's external links
#[derive(Clone)]
pub struct BrokenLinkChecker {
    prober: Arc<dyn LinkProber>,
    max_concurrent: usize,
    probe_timeout: Duration,
}

impl BrokenLinkChecker {
    /// Creates a checker
    ///
    /// # Arguments
    ///
    /// * `prober` - Performs the individual probes
    /// * `max_concurrent` - Upper bound on probes in flight (at least 1)
    /// * `probe_timeout` - Budget for each probe; expiry counts as broken
    pub fn new(prober: Arc<dyn LinkProber>, max_concurrent: usize, probe_timeout: Duration) -> Self {
        Self {
            prober,
            max_concurrent: max_concurrent.max(1),
            probe_timeout,
        }
    }

    /// Probes every distinct link and returns how many anchors are broken
    ///
    /// The result never exceeds `links.len()`.
    pub async fn count_broken(&self, links: &[String]) -> u32 {
        if links.is_empty() {
            return 0;
        }

        let mut occurrences: HashMap<String, u32> = HashMap::new();
        for link in links {
            *occurrences.entry(link.clone()).or_insert(0) += 1;
        }

        let probes = occurrences.into_iter().map(|(url, count)| {
            let prober = Arc::clone(&self.prober);
            let probe_timeout = self.probe_timeout;
            async move {
                let outcome = tokio::time::timeout(probe_timeout, prober.probe(&url))
                    .await
                    .unwrap_or_else(|_| ProbeOutcome::Unreachable {
                        reason: "probe timed out".to_string(),
                    });

                if outcome.is_broken() {
                    tracing::debug!("Broken link {}: {:?}", url, outcome);
                    count
                } else {
                    0
                }
            }
        });

        stream::iter(probes)
            .buffer_unordered(self.max_concurrent)
            .fold(0u32, |tally, broken| async move { tally + broken })
            .await
    }
}
