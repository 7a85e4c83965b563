//! Per-unit outcome definitions
//!
//! Every unit submitted to the executor ends in exactly one of these outcomes.
//! Outcomes travel by value from the executor to the aggregator; nothing in a
//! unit's outcome can abort the run.
use crate::storage::Record;
use std::fmt;

/// Result of running the fetch adapter for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The adapter produced at least one record
    Success(Vec<Record>),

    /// The adapter ran but produced no records (warning, not an error)
    Empty,

    /// Network error, non-success status, missing content or parse failure
    Failure(String),
}

impl UnitOutcome {
    /// Returns true if this outcome carries records to persist
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if the adapter ran cleanly but found nothing
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns true if the unit failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Records produced by this unit (empty unless successful)
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Success(records) => records,
            _ => &[],
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(records) => write!(f, "success ({} records)", records.len()),
            Self::Empty => write!(f, "empty"),
            Self::Failure(reason) => write!(f, "failure: {}", reason),
        }
    }
}
