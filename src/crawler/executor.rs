//! Bounded concurrent executor
//!
//! Runs a fetch adapter over the pending units with at most `workers`
//! adapter invocations in flight. Units complete in any order; each one is
//! submitted exactly once and its failure (or panic) is contained to its own
//! outcome.

use crate::config::RunConfig;
use crate::crawler::adapter::FetchAdapter;
use crate::crawler::outcome::UnitOutcome;
use crate::unit::WorkUnit;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// Bounded worker pool for fetch adapters
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    workers: usize,
    progress_interval: usize,
}

impl Executor {
    /// Creates an executor with the given worker bound (at least one)
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            progress_interval: 10,
        }
    }

    /// Creates an executor from a run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.fetcher.workers).with_progress_interval(config.run.progress_interval)
    }

    /// Logs a progress line every `interval` completed units
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Maximum number of concurrent adapter invocations
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs the adapter over every unit
    ///
    /// The returned pairs are in completion order, not submission order.
    /// This never fails: every unit yields an outcome.
    ///
    /// # Arguments
    ///
    /// * `units` - The pending units
    /// * `adapter` - The fetch adapter invoked once per unit
    pub async fn run<A: FetchAdapter>(
        &self,
        units: Vec<WorkUnit>,
        adapter: &A,
    ) -> Vec<(WorkUnit, UnitOutcome)> {
        let total = units.len();
        if total == 0 {
            tracing::info!("No pending units to fetch");
            return Vec::new();
        }

        tracing::info!(
            "Fetching {} units with {} workers",
            total,
            self.workers.min(total)
        );

        let start_time = Instant::now();
        let mut completions = stream::iter(units)
            .map(|unit| async move {
                let outcome = run_unit(adapter, &unit).await;
                (unit, outcome)
            })
            .buffer_unordered(self.workers);

        let mut results = Vec::with_capacity(total);
        while let Some((unit, outcome)) = completions.next().await {
            results.push((unit, outcome));

            let done = results.len();
            if done % self.progress_interval == 0 || done == total {
                let elapsed = start_time.elapsed();
                let rate = done as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} units completed, {:.2} units/sec",
                    done,
                    total,
                    rate
                );
            }
        }

        results
    }
}

/// Invokes the adapter for one unit and converts whatever happens into an outcome
async fn run_unit<A: FetchAdapter>(adapter: &A, unit: &WorkUnit) -> UnitOutcome {
    let outcome = match AssertUnwindSafe(adapter.fetch(unit)).catch_unwind().await {
        Ok(Ok(records)) if records.is_empty() => UnitOutcome::Empty,
        Ok(Ok(records)) => UnitOutcome::Success(records),
        Ok(Err(e)) => UnitOutcome::Failure(e.to_string()),
        Err(panic) => UnitOutcome::Failure(format!(
            "adapter panicked: {}",
            panic_message(panic.as_ref())
        )),
    };

    match &outcome {
        UnitOutcome::Success(records) => {
            tracing::info!("Processed {}: {} records", unit, records.len());
        }
        UnitOutcome::Empty => {
            tracing::warn!("{} returned no records", unit);
        }
        UnitOutcome::Failure(reason) => {
            tracing::error!("Error processing {}: {}", unit, reason);
        }
    }

    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
