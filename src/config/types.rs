use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for URL Analyzer
///
/// Every section is optional; missing sections and keys fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub worker: WorkerConfig,
    pub fetcher: FetcherConfig,
    #[serde(rename = "broken-links")]
    pub broken_links: BrokenLinkConfig,
    pub storage: StorageConfig,
}

/// Background worker behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds between poll ticks
    #[serde(rename = "poll-interval-secs")]
    pub poll_interval_secs: u64,

    /// Seconds an in-flight request may keep running after shutdown is requested
    #[serde(rename = "shutdown-grace-secs")]
    pub shutdown_grace_secs: u64,

    /// Overall budget for fetching, analyzing and probing one request
    #[serde(rename = "processing-timeout-secs")]
    pub processing_timeout_secs: u64,

    /// Number of poll loops sharing the atomic claim
    pub concurrency: u32,
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            shutdown_grace_secs: 10,
            processing_timeout_secs: 60,
            concurrency: 1,
        }
    }
}

/// Primary page fetch settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Client-side timeout applied to every outbound call
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("url-analyzer/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// External link probing settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokenLinkConfig {
    pub enabled: bool,

    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,

    #[serde(rename = "max-concurrent-probes")]
    pub max_concurrent_probes: usize,
}

impl BrokenLinkConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for BrokenLinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_timeout_secs: 10,
            max_concurrent_probes: 16,
        }
    }
}

/// Storage location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./url-analyzer.db".to_string(),
        }
    }
}
