use serde::Deserialize;
use std::path::PathBuf;

/// User agent sent by default, matching a desktop browser
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Upper bound on the default worker count, to respect the remote source's load tolerance
pub const DEFAULT_WORKER_CAP: usize = 4;

/// Settings that can be loaded from an optional TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub run: RunSettings,
}

/// Remote catalog location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Site origin, e.g. `https://blogtruyenmoi.com`
    pub origin: String,

    /// Path of the paginated list endpoint
    #[serde(rename = "list-path")]
    pub list_path: String,

    /// Value of the `key` query parameter of the list endpoint
    #[serde(rename = "list-key")]
    pub list_key: String,

    /// Value of the `orderBy` query parameter of the list endpoint
    #[serde(rename = "order-by")]
    pub order_by: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            origin: "https://blogtruyenmoi.com".to_string(),
            list_path: "/ajax/Search/AjaxLoadListManga".to_string(),
            list_key: "tatca".to_string(),
            order_by: "0".to_string(),
        }
    }
}

/// HTTP and worker pool settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of units fetched concurrently
    pub workers: usize,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header value
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Run behaviour settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Log a progress line every N completed units
    #[serde(rename = "progress-interval")]
    pub progress_interval: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            progress_interval: 10,
        }
    }
}

/// Which unit source a run draws from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Crawl catalog list pages `page_start..=page_end`
    Pages { page_start: u32, page_end: u32 },

    /// Fetch sub-resources for every identifier in a previous list output
    Images {
        input_file: PathBuf,
        id_column: String,
    },
}

impl RunMode {
    /// Short name used in logs and in the shard manifest
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pages { .. } => "pages",
            Self::Images { .. } => "images",
        }
    }
}

/// Shard assignment of this node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardConfig {
    /// Total number of participating nodes
    pub num_nodes: usize,

    /// Index of this node in `[0, num_nodes)`
    pub node_id: usize,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            num_nodes: 1,
            node_id: 0,
        }
    }
}

/// Complete configuration of one run, passed explicitly to every component
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    pub shard: ShardConfig,
    pub output_file: PathBuf,
    pub source: SourceConfig,
    pub fetcher: FetcherConfig,
    pub run: RunSettings,

    /// Proceed even if the store was written under a different shard layout
    pub ignore_shard_contract: bool,
}

impl RunConfig {
    /// Builds a run configuration from CLI-level values and file-level settings
    pub fn new(mode: RunMode, shard: ShardConfig, output_file: PathBuf, file: FileConfig) -> Self {
        Self {
            mode,
            shard,
            output_file,
            source: file.source,
            fetcher: file.fetcher,
            run: file.run,
            ignore_shard_contract: false,
        }
    }

    /// Name of the checkpoint key column for this run's mode
    pub fn key_column(&self) -> &'static str {
        match self.mode {
            RunMode::Pages { .. } => "page",
            RunMode::Images { .. } => "chapter_url",
        }
    }
}

/// Default worker count: available parallelism, capped
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_WORKER_CAP)
}
