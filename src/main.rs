//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the sharded catalog crawler.

use anyhow::Context;
use catalog_harvest::config::{
    load_config_with_hash, FileConfig, RunConfig, RunMode, ShardConfig,
};
use catalog_harvest::crawler::{run_harvest, RunPlan};
use catalog_harvest::output::{load_store_statistics, print_store_statistics};
use catalog_harvest::storage::CsvCheckpointStore;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a sharded, resumable catalog crawler
///
/// Crawls the paginated catalog listing, or fans out over the chapters found
/// in a previous listing, and checkpoints results into a CSV file. Re-running
/// the same command resumes where the previous run stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A sharded, resumable catalog crawler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl catalog list pages
    Pages {
        /// First page to crawl (1-based)
        #[arg(long, default_value_t = 1)]
        page_start: u32,

        /// Last page to crawl (inclusive)
        #[arg(long)]
        page_end: u32,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Fetch the image list of every chapter in a previous output file
    Images {
        /// CSV file holding the chapter identifiers
        #[arg(long, value_name = "PATH")]
        input_file: PathBuf,

        /// Column of the input file holding the identifiers
        #[arg(long, default_value = "chapter_url")]
        id_column: String,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Checkpoint store to read and update
    #[arg(long, value_name = "PATH")]
    output_file: PathBuf,

    /// Total number of participating nodes
    #[arg(long, default_value_t = 1)]
    num_nodes: usize,

    /// Index of this node in [0, num-nodes)
    #[arg(long, default_value_t = 0)]
    node_id: usize,

    /// Maximum concurrent fetches (defaults to min(CPUs, 4))
    #[arg(long)]
    workers: Option<usize>,

    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Resume even if the store was written under a different shard layout
    #[arg(long)]
    ignore_shard_contract: bool,

    /// Show this node's shard and pending units without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the checkpoint store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mode, common) = match cli.command {
        Command::Pages {
            page_start,
            page_end,
            common,
        } => (
            RunMode::Pages {
                page_start,
                page_end,
            },
            common,
        ),
        Command::Images {
            input_file,
            id_column,
            common,
        } => (
            RunMode::Images {
                input_file,
                id_column,
            },
            common,
        ),
    };

    // Setup logging based on verbosity
    setup_logging(common.verbose, common.quiet);

    let config = build_run_config(mode, &common)?;

    if common.dry_run {
        handle_dry_run(&config)?;
    } else if common.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence over the flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("catalog_harvest=info,warn"),
                1 => EnvFilter::new("catalog_harvest=debug,info"),
                2 => EnvFilter::new("catalog_harvest=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Combines the optional config file with the command-line values
fn build_run_config(mode: RunMode, common: &CommonArgs) -> anyhow::Result<RunConfig> {
    let file_config = match &common.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (cfg, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        None => FileConfig::default(),
    };

    let shard = ShardConfig {
        num_nodes: common.num_nodes,
        node_id: common.node_id,
    };

    let mut config = RunConfig::new(mode, shard, common.output_file.clone(), file_config);
    if let Some(workers) = common.workers {
        config.fetcher.workers = workers;
    }
    config.ignore_shard_contract = common.ignore_shard_contract;

    Ok(config)
}

/// Handles the --dry-run mode: plans the run and shows what would be fetched
fn handle_dry_run(config: &RunConfig) -> anyhow::Result<()> {
    let store = CsvCheckpointStore::new(&config.output_file, config.key_column());
    let plan = RunPlan::build(config, &store)?;

    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Run:");
    println!("  Mode: {}", config.mode.name());
    match &config.mode {
        RunMode::Pages {
            page_start,
            page_end,
        } => println!("  Pages: {}..={}", page_start, page_end),
        RunMode::Images {
            input_file,
            id_column,
        } => println!("  Input: column '{}' of {}", id_column, input_file.display()),
    }
    println!("  Origin: {}", config.source.origin);
    println!("  Workers: {}", config.fetcher.workers);

    println!("\nShard:");
    println!(
        "  Node {} of {}",
        config.shard.node_id, config.shard.num_nodes
    );
    println!(
        "  Units {}..{} of {} ({} units)",
        plan.shard.start,
        plan.shard.end,
        plan.total_units,
        plan.shard_units()
    );

    println!("\nCheckpoint store: {}", config.output_file.display());
    println!("  Already completed: {}", plan.skipped());
    println!("  Pending: {}", plan.pending.len());
    for unit in plan.pending.iter().take(10) {
        println!("    * {}", unit);
    }
    if plan.pending.len() > 10 {
        println!("    ... and {} more", plan.pending.len() - 10);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} units", plan.pending.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics of the checkpoint store
fn handle_stats(config: &RunConfig) -> anyhow::Result<()> {
    let store = CsvCheckpointStore::new(&config.output_file, config.key_column());
    let stats = load_store_statistics(&store)?;
    print_store_statistics(&stats);
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: RunConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting {} harvest into {} (node {} of {})",
        config.mode.name(),
        config.output_file.display(),
        config.shard.node_id,
        config.shard.num_nodes
    );

    match run_harvest(config).await {
        Ok(summary) => {
            if summary.failed > 0 {
                tracing::warn!(
                    "{} units failed and remain pending for the next run",
                    summary.failed
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
