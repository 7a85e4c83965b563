//! Run summary
//!
//! Tallies the per-unit outcomes of one run and the result of persisting
//! them, for the final log line and the CLI.

use crate::crawler::UnitOutcome;
use crate::storage::PersistReport;
use crate::unit::WorkUnit;
use std::path::PathBuf;
use std::time::Duration;

/// Unit that failed during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUnit {
    /// Checkpoint key of the unit
    pub key: String,

    /// Failure reason reported by the adapter
    pub reason: String,
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Units in this node's shard
    pub shard_units: usize,

    /// Shard units skipped because they were already in the store
    pub skipped: usize,

    /// Units submitted to the executor
    pub pending: usize,

    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,

    /// Records added to the store by this run
    pub records_written: usize,

    /// Records in the store after this run
    pub total_records: usize,

    /// Whether the store file was replaced
    pub store_written: bool,

    pub store_path: PathBuf,
    pub elapsed: Duration,

    /// Failed units in submission order
    pub failures: Vec<FailedUnit>,
}

impl RunSummary {
    /// Tallies executor outcomes
    ///
    /// # Arguments
    ///
    /// * `shard_units` - Size of this node's shard
    /// * `skipped` - Shard units filtered out by the resume filter
    /// * `outcomes` - Per-unit outcomes
    pub fn from_outcomes(
        shard_units: usize,
        skipped: usize,
        outcomes: &[(WorkUnit, UnitOutcome)],
    ) -> Self {
        let mut summary = Self {
            shard_units,
            skipped,
            pending: outcomes.len(),
            ..Self::default()
        };

        for (unit, outcome) in outcomes {
            match outcome {
                UnitOutcome::Success(_) => summary.succeeded += 1,
                UnitOutcome::Empty => summary.empty += 1,
                UnitOutcome::Failure(reason) => {
                    summary.failed += 1;
                    summary.failures.push(FailedUnit {
                        key: unit.key(),
                        reason: reason.clone(),
                    });
                }
            }
        }

        summary
    }

    /// Records what the aggregator did
    pub fn with_persist_report(mut self, report: &PersistReport) -> Self {
        self.records_written = report.new_records;
        self.total_records = report.total_records();
        self.store_written = report.written;
        self
    }

    /// Units of the shard that are now in the store
    pub fn completed(&self) -> usize {
        self.skipped + self.succeeded
    }

    /// Whether every shard unit is now in the store
    pub fn is_complete(&self) -> bool {
        self.completed() == self.shard_units
    }

    /// Emits the final summary log line, plus one warning per failed unit
    pub fn log(&self) {
        for failure in &self.failures {
            tracing::warn!("Unit {} failed: {}", failure.key, failure.reason);
        }

        tracing::info!(
            "Run finished in {:.1}s: {} succeeded, {} empty, {} failed, {} skipped; {} records written to {} ({} total)",
            self.elapsed.as_secs_f64(),
            self.succeeded,
            self.empty,
            self.failed,
            self.skipped,
            self.records_written,
            self.store_path.display(),
            self.total_records
        );

        if !self.is_complete() {
            tracing::info!(
                "{} of {} shard units still pending; re-run to resume",
                self.shard_units - self.completed(),
                self.shard_units
            );
        }
    }
}
