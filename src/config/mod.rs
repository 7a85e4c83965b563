//! Configuration module for Catalog-Harvest
//!
//! A run is described by an explicit [`RunConfig`] assembled from the command
//! line and an optional TOML file, then handed to every component.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Fetching from {}", config.source.origin);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_workers, FetcherConfig, FileConfig, RunConfig, RunMode, RunSettings, ShardConfig,
    SourceConfig, DEFAULT_USER_AGENT, DEFAULT_WORKER_CAP,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_shard};
