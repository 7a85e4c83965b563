//! Shard manifest sidecar
//!
//! A checkpoint store is only meaningful under the shard layout it was
//! written with: resuming node 1 of 3 against a store written by node 1 of 2
//! would silently skip or duplicate units. The manifest records that layout
//! next to the store so the mismatch is caught before any fetching starts.

use crate::config::RunConfig;
use crate::storage::atomic_write;
use crate::unit::{fingerprint_units, WorkUnit};
use crate::{ConfigError, PersistResult, PersistenceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Shard layout a checkpoint store was written under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardManifest {
    #[serde(rename = "num-nodes")]
    pub num_nodes: usize,

    #[serde(rename = "node-id")]
    pub node_id: usize,

    /// Run mode name (`pages` or `images`)
    pub mode: String,

    #[serde(rename = "key-column")]
    pub key_column: String,

    /// Number of units in the full, unpartitioned sequence
    #[serde(rename = "unit-count")]
    pub unit_count: usize,

    /// SHA-256 of the full unit sequence
    #[serde(rename = "unit-fingerprint")]
    pub unit_fingerprint: String,

    #[serde(rename = "updated-at")]
    pub updated_at: DateTime<Utc>,
}

impl ShardManifest {
    /// Describes the layout of the current run over the full unit sequence
    pub fn new(config: &RunConfig, units: &[WorkUnit]) -> Self {
        Self {
            num_nodes: config.shard.num_nodes,
            node_id: config.shard.node_id,
            mode: config.mode.name().to_string(),
            key_column: config.key_column().to_string(),
            unit_count: units.len(),
            unit_fingerprint: fingerprint_units(units),
            updated_at: Utc::now(),
        }
    }

    /// Whether both manifests describe the same layout and unit sequence
    pub fn same_layout(&self, other: &ShardManifest) -> bool {
        self.num_nodes == other.num_nodes
            && self.node_id == other.node_id
            && self.mode == other.mode
            && self.key_column == other.key_column
            && self.unit_fingerprint == other.unit_fingerprint
    }

    /// Checks that `current` may resume a store written under `self`
    ///
    /// Differences in node count, node index, mode or key column are errors.
    /// A different unit sequence only warns: the upstream list may have grown
    /// between runs, which keeps the layout meaningful for already-persisted
    /// units.
    pub fn check(&self, current: &ShardManifest, store_path: &Path) -> Result<(), ConfigError> {
        let mut mismatches = Vec::new();

        if self.num_nodes != current.num_nodes {
            mismatches.push(format!(
                "num-nodes was {}, now {}",
                self.num_nodes, current.num_nodes
            ));
        }
        if self.node_id != current.node_id {
            mismatches.push(format!(
                "node-id was {}, now {}",
                self.node_id, current.node_id
            ));
        }
        if self.mode != current.mode {
            mismatches.push(format!("mode was {}, now {}", self.mode, current.mode));
        }
        if self.key_column != current.key_column {
            mismatches.push(format!(
                "key-column was {}, now {}",
                self.key_column, current.key_column
            ));
        }

        if !mismatches.is_empty() {
            return Err(ConfigError::ShardContract {
                path: store_path.display().to_string(),
                message: mismatches.join("; "),
            });
        }

        if self.unit_fingerprint != current.unit_fingerprint {
            tracing::warn!(
                "Unit sequence changed since {} ({} units then, {} now); shard boundaries may have moved",
                self.updated_at.to_rfc3339(),
                self.unit_count,
                current.unit_count
            );
        }

        Ok(())
    }
}

/// Location of the manifest for a store: `<store>.shard.toml`
pub fn manifest_path(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".shard.toml");
    store_path.with_file_name(name)
}

/// Reads the manifest of a store
///
/// # Returns
///
/// * `Ok(None)` - No manifest exists (fresh store, or one written before
///   manifests were kept)
/// * `Ok(Some(manifest))` - The recorded layout
/// * `Err(PersistenceError)` - The manifest exists but cannot be read or parsed
pub fn load_manifest(store_path: &Path) -> PersistResult<Option<ShardManifest>> {
    let path = manifest_path(store_path);
    if !path.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)?;
    let manifest = toml::from_str(&content).map_err(|e| PersistenceError::Malformed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(Some(manifest))
}

/// Atomically writes the manifest of a store
pub fn write_manifest(store_path: &Path, manifest: &ShardManifest) -> PersistResult<()> {
    let path = manifest_path(store_path);
    let content = toml::to_string(manifest)?;

    atomic_write(&path, |file| {
        file.write_all(content.as_bytes())?;
        Ok(())
    })?;

    tracing::debug!("Wrote shard manifest {}", path.display());
    Ok(())
}
