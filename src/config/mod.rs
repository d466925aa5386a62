//! Configuration module for URL Analyzer
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file at all) yields
//! [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use url_analyzer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("analyzer.toml")).unwrap();
//! println!("Worker polls every {}s", config.worker.poll_interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrokenLinkConfig, Config, FetcherConfig, StorageConfig, WorkerConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_config,
};
