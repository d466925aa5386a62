//! URL Analyzer: an asynchronous crawl-and-analyze pipeline
//!
//! Clients queue URLs for analysis; a background worker claims queued requests,
//! fetches and parses each page, computes structural metrics (headings, links,
//! login forms, HTML version, broken links) and records a terminal status.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for URL Analyzer operations
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected status {code} for {url}")]
    UnexpectedStatus { url: String, code: u16 },

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Processing of {url} exceeded {seconds}s")]
    ProcessingTimeout { url: String, seconds: u64 },

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    /// Returns true for network-level failures of the primary fetch
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Timeout { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for URL Analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Worker, WorkerHandle};
pub use state::RequestStatus;
pub use url::{classify_link, LinkKind};
