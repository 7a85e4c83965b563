//! Statistics from an existing checkpoint store
//!
//! Backs the `--stats` flag: reads the store and its shard manifest and
//! prints what has been harvested so far.

use crate::storage::{load_manifest, CheckpointStore, ShardManifest};
use crate::PersistResult;
use std::collections::HashMap;
use std::path::PathBuf;

/// Checkpoint store statistics
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    pub path: PathBuf,

    /// Whether the store file exists
    pub exists: bool,

    /// Column names in file order
    pub columns: Vec<String>,

    pub total_records: usize,

    /// Distinct unit keys
    pub unit_count: usize,

    /// Fewest and most records produced by one unit
    pub min_records_per_unit: usize,
    pub max_records_per_unit: usize,

    /// Shard layout recorded next to the store, if any
    pub manifest: Option<ShardManifest>,
}

impl StoreStatistics {
    /// Mean number of records per unit
    pub fn mean_records_per_unit(&self) -> f64 {
        if self.unit_count == 0 {
            0.0
        } else {
            self.total_records as f64 / self.unit_count as f64
        }
    }
}

/// Loads statistics from a checkpoint store
///
/// # Arguments
///
/// * `store` - The checkpoint store to inspect
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Statistics; a missing store yields zero counts
/// * `Err(PersistenceError)` - The store or its manifest cannot be read
pub fn load_store_statistics<S: CheckpointStore>(store: &S) -> PersistResult<StoreStatistics> {
    let manifest = load_manifest(store.path())?;
    let snapshot = store.load()?;

    let mut stats = StoreStatistics {
        path: store.path().to_path_buf(),
        exists: snapshot.is_some(),
        columns: Vec::new(),
        total_records: 0,
        unit_count: 0,
        min_records_per_unit: 0,
        max_records_per_unit: 0,
        manifest,
    };

    let Some(snapshot) = snapshot else {
        return Ok(stats);
    };

    let mut per_unit: HashMap<&str, usize> = HashMap::new();
    for key in snapshot.keys() {
        *per_unit.entry(key).or_insert(0) += 1;
    }

    stats.columns = snapshot.header.clone();
    stats.total_records = snapshot.records.len();
    stats.unit_count = per_unit.len();
    stats.min_records_per_unit = per_unit.values().copied().min().unwrap_or(0);
    stats.max_records_per_unit = per_unit.values().copied().max().unwrap_or(0);

    Ok(stats)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_store_statistics(stats: &StoreStatistics) {
    println!("=== Checkpoint Store Statistics ===\n");

    println!("Store: {}", stats.path.display());
    if !stats.exists {
        println!("  (not created yet)");
        return;
    }
    println!("  Columns: {}", stats.columns.join(", "));
    println!();

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!("  Completed units: {}", stats.unit_count);
    println!(
        "  Records per unit: min {}, max {}, mean {:.1}",
        stats.min_records_per_unit,
        stats.max_records_per_unit,
        stats.mean_records_per_unit()
    );
    println!();

    match &stats.manifest {
        Some(manifest) => {
            println!("Shard Layout:");
            println!("  Mode: {}", manifest.mode);
            println!("  Node: {} of {}", manifest.node_id, manifest.num_nodes);
            println!("  Key column: {}", manifest.key_column);
            println!("  Units in full sequence: {}", manifest.unit_count);
            println!("  Last updated: {}", manifest.updated_at.to_rfc3339());
        }
        None => println!("Shard Layout: unknown (no manifest)"),
    }
}
