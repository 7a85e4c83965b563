//! Crawler coordinator - run orchestration
//!
//! This module wires the pipeline of one run together:
//! - Validating the configuration and producing the unit sequence
//! - Selecting this node's shard and checking the store's shard manifest
//! - Filtering out units already in the checkpoint store
//! - Executing the pending units and persisting their records
//! - Producing the run summary

use crate::config::{validate, RunConfig, RunMode};
use crate::crawler::adapter::FetchAdapter;
use crate::crawler::catalog::CatalogPageAdapter;
use crate::crawler::chapter::ChapterImageAdapter;
use crate::crawler::executor::Executor;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::outcome::UnitOutcome;
use crate::output::RunSummary;
use crate::storage::{
    load_manifest, merge_and_persist, write_manifest, CheckpointStore, CsvCheckpointStore,
    ShardManifest, Snapshot,
};
use crate::unit::{completed_keys, pending, shard_range, UnitSource, WorkUnit};
use crate::{ConfigError, HarvestError};
use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

/// Everything decided before the first request is sent
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Size of the full, unpartitioned unit sequence
    pub total_units: usize,

    /// Positions of this node's shard within the full sequence
    pub shard: Range<usize>,

    /// Shard units still to fetch, in sequence order
    pub pending: Vec<WorkUnit>,

    /// Store content at the start of the run
    pub existing: Option<Snapshot>,

    /// Layout of this run, written beside the store after persisting
    pub manifest: ShardManifest,

    /// Whether the manifest on disk is missing or describes another layout
    pub manifest_stale: bool,
}

impl RunPlan {
    /// Builds the plan for a run against `store`
    ///
    /// # Returns
    ///
    /// * `Ok(RunPlan)` - The run may start
    /// * `Err(HarvestError)` - Invalid configuration, bad unit source, shard
    ///   contract violation or unreadable store
    pub fn build<S: CheckpointStore>(config: &RunConfig, store: &S) -> Result<Self, HarvestError> {
        validate(config)?;

        let source = UnitSource::from_config(config)?;
        let units = source.units()?;
        tracing::info!("Unit source: {} ({} units)", source.describe(), units.len());

        let shard = shard_range(units.len(), config.shard.num_nodes, config.shard.node_id)?;
        tracing::info!(
            "Node {} of {} owns units {}..{} ({} units)",
            config.shard.node_id,
            config.shard.num_nodes,
            shard.start,
            shard.end,
            shard.len()
        );

        let manifest = ShardManifest::new(config, &units);
        let recorded = load_manifest(store.path())?;
        if let Some(recorded) = &recorded {
            if let Err(e) = recorded.check(&manifest, store.path()) {
                if !config.ignore_shard_contract {
                    return Err(e.into());
                }
                tracing::warn!("Ignoring shard contract: {}", e);
            }
        }

        let existing = store.load()?;
        let origin = match &source {
            UnitSource::InputFile { origin, .. } => origin.clone(),
            UnitSource::PageRange { .. } => None,
        };
        let completed = match &existing {
            Some(snapshot) => completed_keys(snapshot.keys(), source.kind(), origin.as_ref()),
            None => {
                tracing::info!(
                    "No checkpoint store at {}, starting fresh",
                    store.path().display()
                );
                Default::default()
            }
        };

        let pending = pending(&units[shard.clone()], &completed);
        let manifest_stale = recorded.map_or(true, |r| !r.same_layout(&manifest));

        Ok(Self {
            total_units: units.len(),
            shard,
            pending,
            existing,
            manifest,
            manifest_stale,
        })
    }

    /// Number of units in this node's shard
    pub fn shard_units(&self) -> usize {
        self.shard.len()
    }

    /// Shard units already in the store
    pub fn skipped(&self) -> usize {
        self.shard_units() - self.pending.len()
    }
}

/// Main coordinator structure
pub struct Coordinator<A: FetchAdapter> {
    config: RunConfig,
    store: CsvCheckpointStore,
    adapter: A,
}

impl<A: FetchAdapter> Coordinator<A> {
    /// Creates a coordinator for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration
    /// * `adapter` - The fetch adapter for the run's unit kind
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to plan and run
    /// * `Err(ConfigError)` - The adapter does not produce the run's key column
    pub fn new(config: RunConfig, adapter: A) -> Result<Self, ConfigError> {
        if adapter.key_column() != config.key_column() {
            return Err(ConfigError::Validation(format!(
                "adapter writes key column '{}' but {} mode stores '{}'",
                adapter.key_column(),
                config.mode.name(),
                config.key_column()
            )));
        }

        let store = CsvCheckpointStore::new(&config.output_file, config.key_column());

        Ok(Self {
            config,
            store,
            adapter,
        })
    }

    /// The checkpoint store this run reads and writes
    pub fn store(&self) -> &CsvCheckpointStore {
        &self.store
    }

    /// Plans the run without fetching anything
    pub fn plan(&self) -> Result<RunPlan, HarvestError> {
        RunPlan::build(&self.config, &self.store)
    }

    /// Runs the crawl
    ///
    /// Per-unit failures never abort the run; they are reported in the
    /// summary and the units stay pending for the next run.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run finished and the store is up to date
    /// * `Err(HarvestError)` - A configuration or persistence error
    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        let start_time = Instant::now();
        let plan = self.plan()?;

        let shard_units = plan.shard_units();
        let skipped = plan.skipped();
        let RunPlan {
            pending,
            existing,
            manifest,
            manifest_stale,
            ..
        } = plan;

        let executor = Executor::from_config(&self.config);
        let outcomes = executor.run(pending.clone(), &self.adapter).await;
        let outcomes = in_submission_order(&pending, outcomes);

        let mut summary = RunSummary::from_outcomes(shard_units, skipped, &outcomes);
        summary.store_path = self.store.path().to_path_buf();

        let report = merge_and_persist(&self.store, existing, &outcomes)?;
        if report.written || manifest_stale {
            write_manifest(self.store.path(), &manifest)?;
        }

        summary = summary.with_persist_report(&report);
        summary.elapsed = start_time.elapsed();
        summary.log();

        Ok(summary)
    }
}

/// Reorders completion-ordered outcomes back into submission order
///
/// Keeps the store layout independent of network timing.
fn in_submission_order(
    pending: &[WorkUnit],
    mut outcomes: Vec<(WorkUnit, UnitOutcome)>,
) -> Vec<(WorkUnit, UnitOutcome)> {
    let position: HashMap<&WorkUnit, usize> =
        pending.iter().enumerate().map(|(i, u)| (u, i)).collect();
    outcomes.sort_by_key(|(unit, _)| position.get(unit).copied().unwrap_or(usize::MAX));
    outcomes
}

/// Runs a complete harvest with the adapter matching the configured mode
///
/// # Arguments
///
/// * `config` - The run configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - Harvest completed
/// * `Err(HarvestError)` - Harvest failed
pub async fn run_harvest(config: RunConfig) -> Result<RunSummary, HarvestError> {
    validate(&config)?;
    let client = build_http_client(&config.fetcher)?;

    match config.mode {
        RunMode::Pages { .. } => {
            let adapter = CatalogPageAdapter::new(client, &config.source)?;
            Coordinator::new(config, adapter)?.run().await
        }
        RunMode::Images { .. } => {
            let adapter = ChapterImageAdapter::new(client, &config.source.origin)?;
            Coordinator::new(config, adapter)?.run().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, ShardConfig};
    use crate::crawler::adapter::FetchError;
    use crate::storage::Record;
    use crate::unit::UnitKind;
    use crate::PersistenceError;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Adapter returning one record per page, failing the pages listed in `fail`
    struct PageAdapter {
        fail: Vec<u32>,
        fetched: Mutex<Vec<String>>,
    }

    impl PageAdapter {
        fn new(fail: &[u32]) -> Self {
            Self {
                fail: fail.to_vec(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            let mut keys = self.fetched.lock().unwrap().clone();
            keys.sort();
            keys
        }
    }

    impl FetchAdapter for PageAdapter {
        fn kind(&self) -> UnitKind {
            UnitKind::ListPage
        }

        fn key_column(&self) -> &str {
            "page"
        }

        async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<Record>, FetchError> {
            let key = unit.key();
            self.fetched.lock().unwrap().push(key.clone());

            if self.fail.iter().any(|p| p.to_string() == key) {
                return Err(FetchError::Status {
                    url: format!("https://example.com/p/{}", key),
                    status: 500,
                });
            }
            Ok(vec![Record::new(key.clone())
                .with_field("page", key.clone())
                .with_field("title", format!("Title {}", key))])
        }
    }

    fn pages_config(output: &Path, end: u32, num_nodes: usize, node_id: usize) -> RunConfig {
        RunConfig::new(
            RunMode::Pages {
                page_start: 1,
                page_end: end,
            },
            ShardConfig { num_nodes, node_id },
            output.to_path_buf(),
            FileConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_node_zero_resumes_remaining_unit() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");
        std::fs::write(&output, "page,title\n1,Title 1\n2,Title 2\n").unwrap();

        let coordinator =
            Coordinator::new(pages_config(&output, 6, 2, 0), PageAdapter::new(&[])).unwrap();

        let plan = coordinator.plan().unwrap();
        assert_eq!(plan.shard, 0..3);
        assert_eq!(plan.pending, vec![WorkUnit::page(3)]);

        let summary = coordinator.run().await.unwrap();
        assert_eq!(coordinator.adapter.fetched(), vec!["3"]);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.succeeded, 1);
        assert!(summary.is_complete());

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content, "page,title\n1,Title 1\n2,Title 2\n3,Title 3\n");
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");
        let config = pages_config(&output, 4, 1, 0);

        let first = Coordinator::new(config.clone(), PageAdapter::new(&[])).unwrap();
        first.run().await.unwrap();
        let after_first = std::fs::read(&output).unwrap();

        let second = Coordinator::new(config, PageAdapter::new(&[])).unwrap();
        let summary = second.run().await.unwrap();

        assert!(second.adapter.fetched().is_empty());
        assert!(!summary.store_written);
        assert_eq!(std::fs::read(&output).unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_failed_units_are_retried_next_run() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");
        let config = pages_config(&output, 4, 1, 0);

        let first = Coordinator::new(config.clone(), PageAdapter::new(&[2, 3])).unwrap();
        let summary = first.run().await.unwrap();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.records_written, 2);

        let second = Coordinator::new(config, PageAdapter::new(&[])).unwrap();
        second.run().await.unwrap();
        assert_eq!(second.adapter.fetched(), vec!["2", "3"]);

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            content,
            "page,title\n1,Title 1\n4,Title 4\n2,Title 2\n3,Title 3\n"
        );
    }

    #[tokio::test]
    async fn test_all_failed_without_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");

        let coordinator =
            Coordinator::new(pages_config(&output, 2, 1, 0), PageAdapter::new(&[1, 2])).unwrap();
        let result = coordinator.run().await;

        assert!(matches!(
            result,
            Err(HarvestError::Persistence(
                PersistenceError::NothingToPersist { .. }
            ))
        ));
        assert!(!output.exists());
        assert!(load_manifest(&output).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_changed_node_count_is_rejected() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");

        Coordinator::new(pages_config(&output, 6, 2, 0), PageAdapter::new(&[]))
            .unwrap()
            .run()
            .await
            .unwrap();

        let coordinator =
            Coordinator::new(pages_config(&output, 6, 3, 0), PageAdapter::new(&[])).unwrap();
        let result = coordinator.run().await;

        assert!(matches!(
            result,
            Err(HarvestError::Config(ConfigError::ShardContract { .. }))
        ));
        assert!(coordinator.adapter.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_ignore_shard_contract() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");

        Coordinator::new(pages_config(&output, 6, 2, 0), PageAdapter::new(&[]))
            .unwrap()
            .run()
            .await
            .unwrap();

        let mut config = pages_config(&output, 6, 3, 0);
        config.ignore_shard_contract = true;
        let coordinator = Coordinator::new(config, PageAdapter::new(&[])).unwrap();
        let summary = coordinator.run().await.unwrap();

        assert_eq!(summary.skipped, 2);
        let manifest = load_manifest(&output).unwrap().unwrap();
        assert_eq!(manifest.num_nodes, 3);
    }

    #[test]
    fn test_invalid_shard_is_rejected_before_planning() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("list.csv");

        let coordinator =
            Coordinator::new(pages_config(&output, 6, 2, 2), PageAdapter::new(&[])).unwrap();
        assert!(matches!(
            coordinator.plan(),
            Err(HarvestError::Config(ConfigError::InvalidShard { .. }))
        ));
    }

    #[test]
    fn test_adapter_key_column_must_match_mode() {
        let config = RunConfig::new(
            RunMode::Images {
                input_file: "list.csv".into(),
                id_column: "chapter_url".to_string(),
            },
            ShardConfig::default(),
            "images.csv".into(),
            FileConfig::default(),
        );
        assert!(Coordinator::new(config, PageAdapter::new(&[])).is_err());
    }

    #[test]
    fn test_in_submission_order() {
        let pending = vec![WorkUnit::page(1), WorkUnit::page(2), WorkUnit::page(3)];
        let outcomes = vec![
            (WorkUnit::page(3), UnitOutcome::Empty),
            (WorkUnit::page(1), UnitOutcome::Empty),
            (WorkUnit::page(2), UnitOutcome::Empty),
        ];
        let ordered: Vec<String> = in_submission_order(&pending, outcomes)
            .into_iter()
            .map(|(u, _)| u.key())
            .collect();
        assert_eq!(ordered, vec!["1", "2", "3"]);
    }
}
