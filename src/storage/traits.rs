//! Checkpoint store trait
//!
//! The crawl core only needs two things from durable storage: read the whole
//! store into memory, and atomically replace it. Backends implement exactly
//! that.

use crate::storage::Record;
use crate::PersistResult;
use std::path::Path;

/// In-memory copy of a checkpoint store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Column names in file order
    pub header: Vec<String>,

    /// All persisted records in file order
    pub records: Vec<Record>,
}

impl Snapshot {
    /// Raw unit keys of all records, one entry per record
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.key())
    }

    /// Number of distinct unit keys
    pub fn unit_count(&self) -> usize {
        let keys: std::collections::HashSet<&str> = self.keys().collect();
        keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Trait for checkpoint store backends
///
/// Implementations must guarantee that [`CheckpointStore::replace`] is atomic:
/// a concurrent or later reader sees either the old content or the new
/// content in full.
pub trait CheckpointStore {
    /// Location of the store
    fn path(&self) -> &Path;

    /// Column holding the unit key of each record
    fn key_column(&self) -> &str;

    /// Whether the store has been created yet
    fn exists(&self) -> bool;

    /// Reads the whole store
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The store does not exist yet (first run)
    /// * `Ok(Some(Snapshot))` - All persisted records
    /// * `Err(PersistenceError)` - The store exists but cannot be read
    fn load(&self) -> PersistResult<Option<Snapshot>>;

    /// Atomically replaces the store content
    fn replace(&self, header: &[String], records: &[Record]) -> PersistResult<()>;
}
