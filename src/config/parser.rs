use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration text
///
/// An empty document yields [`Config::default`].
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads and validates the analyzer configuration at `path`
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use url_analyzer::config::load_config;
///
/// let config = load_config(Path::new("analyzer.toml")).unwrap();
/// println!("Poll interval: {}s", config.worker.poll_interval_secs);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Hex-encoded SHA-256 of a configuration file
///
/// Logged at startup so a worker's log can be matched to the exact file it ran with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_content(&std::fs::read_to_string(path)?))
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration together with the hash of the text it was parsed from
///
/// The file is read once, so the hash always describes the loaded config.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

/// Resolves the configuration the binary runs with
///
/// Without a path every section takes its defaults and no hash is reported.
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded (hash: {})", hash);
            Ok((config, Some(hash)))
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Ok((Config::default(), None))
        }
    }
}
