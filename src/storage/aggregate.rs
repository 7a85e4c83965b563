//! Aggregation of unit outcomes into the checkpoint store
//!
//! Successful records are appended after the snapshot loaded at startup and
//! the store is written back in one atomic replace. Empty and failed units
//! contribute no rows, so they are retried on the next run.

use crate::crawler::UnitOutcome;
use crate::storage::traits::{CheckpointStore, Snapshot};
use crate::storage::Record;
use crate::unit::WorkUnit;
use crate::{PersistResult, PersistenceError};

/// What a call to [`merge_and_persist`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    /// Records already in the store before this run
    pub existing_records: usize,

    /// Records produced by this run
    pub new_records: usize,

    /// Units whose records were added by this run
    pub units_persisted: usize,

    /// Whether the store file was replaced
    pub written: bool,
}

impl PersistReport {
    /// Records in the store after this run
    pub fn total_records(&self) -> usize {
        self.existing_records + self.new_records
    }
}

/// Merges the successful outcomes of a run into the checkpoint store
///
/// Existing records come first, in file order, followed by the new records in
/// the order of `outcomes`. The store is replaced atomically, so a unit's
/// records are either all persisted or not at all.
///
/// # Arguments
///
/// * `store` - The checkpoint store to update
/// * `existing` - The snapshot loaded at the start of the run, if any
/// * `outcomes` - Per-unit outcomes from the executor
///
/// # Returns
///
/// * `Ok(PersistReport)` - The store holds the union of old and new records,
///   or nothing new was produced and the store was left untouched
/// * `Err(PersistenceError::NothingToPersist)` - No new and no existing
///   records; the store is not created
pub fn merge_and_persist<S: CheckpointStore>(
    store: &S,
    existing: Option<Snapshot>,
    outcomes: &[(WorkUnit, UnitOutcome)],
) -> PersistResult<PersistReport> {
    let existing = existing.unwrap_or_default();

    let new_records: Vec<&Record> = outcomes
        .iter()
        .flat_map(|(_, outcome)| outcome.records())
        .collect();
    let units_persisted = outcomes.iter().filter(|(_, o)| o.is_success()).count();

    let mut report = PersistReport {
        existing_records: existing.records.len(),
        new_records: new_records.len(),
        units_persisted,
        written: false,
    };

    if new_records.is_empty() {
        if existing.is_empty() {
            return Err(PersistenceError::NothingToPersist {
                path: store.path().display().to_string(),
            });
        }

        tracing::warn!(
            "No new records produced; {} existing records in {} left unchanged",
            existing.records.len(),
            store.path().display()
        );
        return Ok(report);
    }

    let header = merged_header(&existing.header, store.key_column(), &new_records);

    let mut merged = existing.records;
    merged.extend(new_records.into_iter().cloned());

    store.replace(&header, &merged)?;
    report.written = true;

    tracing::info!(
        "Persisted {} new records from {} units ({} total) to {}",
        report.new_records,
        report.units_persisted,
        report.total_records(),
        store.path().display()
    );

    Ok(report)
}

/// Existing header extended by the columns of the new records, first seen first
fn merged_header(existing: &[String], key_column: &str, new_records: &[&Record]) -> Vec<String> {
    let mut header = existing.to_vec();

    if !header.iter().any(|h| h == key_column) {
        header.insert(0, key_column.to_string());
    }

    for record in new_records {
        for (name, _) in record.fields() {
            if !header.contains(name) {
                header.push(name.clone());
            }
        }
    }

    header
}
