//! Fetch adapter boundary
//!
//! An adapter turns one work unit into zero or more records via a network
//! call and response parsing. The crawl core never looks at markup itself.

use crate::storage::Record;
use crate::unit::{UnitKind, WorkUnit};
use std::future::Future;
use thiserror::Error;

/// Per-unit fetch failures
///
/// These are recovered at the executor boundary and become
/// [`UnitOutcome::Failure`](crate::crawler::UnitOutcome::Failure).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("No content found at {url}")]
    MissingContent { url: String },

    #[error("Failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Adapter for {expected} units cannot fetch {unit}")]
    UnsupportedUnit { expected: UnitKind, unit: String },
}

/// Pluggable unit fetcher
///
/// Implementations must be pure functions of the unit: the same unit may be
/// fetched again in a later run, and no state is shared between units.
pub trait FetchAdapter {
    /// Kind of units this adapter accepts
    fn kind(&self) -> UnitKind;

    /// Column of the produced records holding the unit key
    fn key_column(&self) -> &str;

    /// Fetches and parses one unit
    ///
    /// # Returns
    ///
    /// * `Ok(records)` - The unit's records; an empty vector means the unit
    ///   produced nothing
    /// * `Err(FetchError)` - The unit failed
    fn fetch(
        &self,
        unit: &WorkUnit,
    ) -> impl Future<Output = Result<Vec<Record>, FetchError>> + Send;
}
