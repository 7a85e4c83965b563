//! Catalog-Harvest: a sharded, resumable catalog crawler
//!
//! This crate crawls a paginated catalog, then fans out over the discovered
//! items to fetch their sub-resources. Work is split across nodes, fetched by a
//! bounded pool of concurrent workers and checkpointed into a flat CSV store so
//! that any run can be restarted without re-fetching completed units.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod unit;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
///
/// Only configuration and persistence problems abort a run. Per-unit fetch
/// failures never surface here; they are recorded as unit outcomes.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are fatal and raised before any unit is fetched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid shard: node index {node_index} with {node_count} nodes")]
    InvalidShard { node_count: usize, node_index: usize },

    #[error("Empty page range: {start}..={end}")]
    EmptyPageRange { start: u32, end: u32 },

    #[error("Unit source {path} is missing or unreadable: {message}")]
    UnitSource { path: String, message: String },

    #[error("Unit source {path} has no column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("Shard contract mismatch for {path}: {message}")]
    ShardContract { path: String, message: String },
}

/// Checkpoint store errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("No records were produced and no existing records were found for {path}")]
    NothingToPersist { path: String },

    #[error("Checkpoint store {path} is malformed: {message}")]
    Malformed { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for checkpoint store operations
pub type PersistResult<T> = std::result::Result<T, PersistenceError>;

// Re-export commonly used types
pub use config::RunConfig;
pub use crawler::{Executor, FetchAdapter, UnitOutcome};
pub use storage::{CheckpointStore, CsvCheckpointStore, Record};
pub use unit::{partition, pending, UnitId, UnitKind, UnitSource, WorkUnit};
