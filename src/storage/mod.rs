//! Storage module for the checkpoint store
//!
//! This module handles everything that touches durable state:
//! - Reading the existing checkpoint store into memory
//! - Merging new unit results with existing records
//! - Atomically replacing the store file
//! - Recording and checking the shard layout a store was written under

mod aggregate;
mod csv_store;
mod manifest;
mod traits;

pub use aggregate::{merge_and_persist, PersistReport};
pub use csv_store::CsvCheckpointStore;
pub use manifest::{load_manifest, manifest_path, write_manifest, ShardManifest};
pub use traits::{CheckpointStore, Snapshot};

use crate::PersistResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// One output row, tagged with the key of the unit that produced it
///
/// Fields keep their insertion order, which becomes the column order of a
/// freshly created store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: String,
    fields: Vec<(String, String)>,
}

impl Record {
    /// Creates an empty record for the unit with the given key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Sets a field, replacing an existing value of the same name
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Key of the unit that produced this record
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Looks up a field value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in insertion order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Writes a file by filling a temporary sibling and renaming it into place
///
/// Readers observe either the previous content or the complete new content,
/// never a partial write. Missing parent directories are created.
pub(crate) fn atomic_write<F>(path: &Path, write: F) -> PersistResult<()>
where
    F: FnOnce(&mut File) -> PersistResult<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::trace!("Atomically replaced {}", path.display());
    Ok(())
}
