//! CSV checkpoint store
//!
//! One row per record, a header row naming every column, keyed by a
//! designated identifier column.

use crate::storage::traits::{CheckpointStore, Snapshot};
use crate::storage::{atomic_write, Record};
use crate::{PersistResult, PersistenceError};
use std::path::{Path, PathBuf};

/// CSV-file checkpoint store
#[derive(Debug, Clone)]
pub struct CsvCheckpointStore {
    path: PathBuf,
    key_column: String,
}

impl CsvCheckpointStore {
    /// Creates a handle on the store at `path`; nothing is read or written yet
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the CSV file
    /// * `key_column` - Column holding the unit key (`page`, `chapter_url`, ...)
    pub fn new(path: impl Into<PathBuf>, key_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key_column: key_column.into(),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> PersistenceError {
        PersistenceError::Malformed {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

impl CheckpointStore for CsvCheckpointStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn key_column(&self) -> &str {
        &self.key_column
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> PersistResult<Option<Snapshot>> {
        if !self.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let header: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let key_index = header
            .iter()
            .position(|h| *h == self.key_column)
            .ok_or_else(|| self.malformed(format!("missing key column '{}'", self.key_column)))?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let key = row.get(key_index).unwrap_or("");
            let mut record = Record::new(key);
            for (name, value) in header.iter().zip(row.iter()) {
                record.push(name.as_str(), value);
            }
            records.push(record);
        }

        tracing::debug!(
            "Loaded {} records from checkpoint store {}",
            records.len(),
            self.path.display()
        );

        Ok(Some(Snapshot { header, records }))
    }

    fn replace(&self, header: &[String], records: &[Record]) -> PersistResult<()> {
        if !header.iter().any(|h| *h == self.key_column) {
            return Err(self.malformed(format!(
                "refusing to write without key column '{}'",
                self.key_column
            )));
        }

        atomic_write(&self.path, |file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(header)?;

            for record in records {
                let row = header.iter().map(|column| {
                    match record.get(column) {
                        Some(value) => value,
                        None if *column == self.key_column => record.key(),
                        None => "",
                    }
                });
                writer.write_record(row)?;
            }

            writer.flush()?;
            Ok(())
        })
    }
}
