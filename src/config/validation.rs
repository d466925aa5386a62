use crate::config::types::{BrokenLinkConfig, Config, FetcherConfig, StorageConfig, WorkerConfig};
use crate::ConfigError;

const MAX_WORKER_CONCURRENCY: u32 = 32;
const MAX_CONCURRENT_PROBES: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_worker_config(&config.worker)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_broken_link_config(&config.broken_links)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates worker scheduling settings
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    require_positive("poll_interval_secs", config.poll_interval_secs)?;
    require_positive("shutdown_grace_secs", config.shutdown_grace_secs)?;
    require_positive("processing_timeout_secs", config.processing_timeout_secs)?;

    if config.concurrency < 1 || config.concurrency > MAX_WORKER_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_WORKER_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

/// Validates fetcher settings
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    require_positive("timeout_secs", config.timeout_secs)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates broken-link probe settings
fn validate_broken_link_config(config: &BrokenLinkConfig) -> Result<(), ConfigError> {
    require_positive("probe_timeout_secs", config.probe_timeout_secs)?;

    if config.max_concurrent_probes < 1 || config.max_concurrent_probes > MAX_CONCURRENT_PROBES {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_probes must be between 1 and {}, got {}",
            MAX_CONCURRENT_PROBES, config.max_concurrent_probes
        )));
    }

    Ok(())
}

/// Validates storage settings
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn require_positive(name: &str, value: u64) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 1, got {}",
            name, value
        )));
    }
    Ok(())
}
