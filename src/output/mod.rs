//! Output module for run summaries and store statistics
//!
//! This module handles:
//! - Tallying unit outcomes into the end-of-run summary
//! - Reporting what an existing checkpoint store holds

pub mod stats;
mod summary;

pub use stats::{load_store_statistics, print_store_statistics, StoreStatistics};
pub use summary::{FailedUnit, RunSummary};
