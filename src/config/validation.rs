use crate::config::types::{
    FetcherConfig, FileConfig, RunConfig, RunMode, RunSettings, ShardConfig, SourceConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest accepted worker count
const MAX_WORKERS: usize = 64;

/// Validates the settings that may come from a config file
pub fn validate_file_config(config: &FileConfig) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_run_settings(&config.run)?;
    Ok(())
}

/// Validates a complete run configuration
///
/// Everything checked here is fatal: a run with an invalid configuration
/// never starts fetching.
pub fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    validate_shard(&config.shard)?;
    validate_mode(&config.mode)?;

    if config.output_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_file cannot be empty".to_string(),
        ));
    }

    validate_source_config(&config.source)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_run_settings(&config.run)?;
    Ok(())
}

/// Validates the shard parameters
pub fn validate_shard(shard: &ShardConfig) -> Result<(), ConfigError> {
    if shard.num_nodes == 0 || shard.node_id >= shard.num_nodes {
        return Err(ConfigError::InvalidShard {
            node_count: shard.num_nodes,
            node_index: shard.node_id,
        });
    }
    Ok(())
}

fn validate_mode(mode: &RunMode) -> Result<(), ConfigError> {
    match mode {
        RunMode::Pages {
            page_start,
            page_end,
        } => {
            if *page_start == 0 || page_start > page_end {
                return Err(ConfigError::EmptyPageRange {
                    start: *page_start,
                    end: *page_end,
                });
            }
        }
        RunMode::Images {
            input_file,
            id_column,
        } => {
            if input_file.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "input_file cannot be empty".to_string(),
                ));
            }
            if id_column.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "id_column cannot be empty".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let origin = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.scheme() != "http" && origin.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Origin '{}' must use http or https",
            config.origin
        )));
    }

    if origin.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Origin '{}' has no host",
            config.origin
        )));
    }

    if !config.list_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "list_path must start with '/', got '{}'",
            config.list_path
        )));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_run_settings(config: &RunSettings) -> Result<(), ConfigError> {
    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "progress_interval must be >= 1, got {}",
            config.progress_interval
        )));
    }
    Ok(())
}
