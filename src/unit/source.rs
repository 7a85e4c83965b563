//! Unit sources
//!
//! A unit source produces the complete, ordered unit sequence of a run. It is
//! restartable: calling [`UnitSource::units`] twice with the same configuration
//! yields the same sequence, which is what keeps shard assignment stable
//! across runs.

use crate::config::{RunConfig, RunMode};
use crate::unit::{normalize_identifier, UnitKind, WorkUnit};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Where the units of a run come from
#[derive(Debug, Clone)]
pub enum UnitSource {
    /// Catalog list pages `start..=end`
    PageRange { start: u32, end: u32 },

    /// Item identifiers read from one column of a previous list output
    InputFile {
        path: PathBuf,
        column: String,
        origin: Option<Url>,
    },
}

impl UnitSource {
    /// Builds the unit source described by a run configuration
    pub fn from_config(config: &RunConfig) -> Result<Self, ConfigError> {
        match &config.mode {
            RunMode::Pages {
                page_start,
                page_end,
            } => Ok(Self::PageRange {
                start: *page_start,
                end: *page_end,
            }),
            RunMode::Images {
                input_file,
                id_column,
            } => {
                let origin = Url::parse(&config.source.origin).map_err(|e| {
                    ConfigError::InvalidUrl(format!(
                        "Invalid origin '{}': {}",
                        config.source.origin, e
                    ))
                })?;
                Ok(Self::InputFile {
                    path: input_file.clone(),
                    column: id_column.clone(),
                    origin: Some(origin),
                })
            }
        }
    }

    /// The kind of every unit this source produces
    pub fn kind(&self) -> UnitKind {
        match self {
            Self::PageRange { .. } => UnitKind::ListPage,
            Self::InputFile { .. } => UnitKind::ItemFetch,
        }
    }

    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::PageRange { start, end } => format!("pages {}..={}", start, end),
            Self::InputFile { path, column, .. } => {
                format!("column '{}' of {}", column, path.display())
            }
        }
    }

    /// Produces the ordered unit sequence
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<WorkUnit>)` - The complete sequence, unique by identifier
    /// * `Err(ConfigError)` - Empty page range, missing or malformed input file
    pub fn units(&self) -> Result<Vec<WorkUnit>, ConfigError> {
        match self {
            Self::PageRange { start, end } => {
                if *start == 0 || start > end {
                    return Err(ConfigError::EmptyPageRange {
                        start: *start,
                        end: *end,
                    });
                }
                Ok((*start..=*end).map(WorkUnit::page).collect())
            }
            Self::InputFile {
                path,
                column,
                origin,
            } => read_item_units(path, column, origin.as_ref()),
        }
    }
}

/// Reads, normalizes and deduplicates item identifiers from a CSV column
fn read_item_units(
    path: &Path,
    column: &str,
    origin: Option<&Url>,
) -> Result<Vec<WorkUnit>, ConfigError> {
    let source_error = |message: String| ConfigError::UnitSource {
        path: path.display().to_string(),
        message,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| source_error(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| source_error(e.to_string()))?
        .clone();

    let index = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| ConfigError::MissingColumn {
            path: path.display().to_string(),
            column: column.to_string(),
        })?;

    let mut seen = HashSet::new();
    let mut units = Vec::new();
    let mut rows = 0usize;

    for row in reader.records() {
        let row = row.map_err(|e| source_error(e.to_string()))?;
        rows += 1;

        let raw = row.get(index).unwrap_or("");
        let id = normalize_identifier(raw, UnitKind::ItemFetch, origin);
        if id.is_empty() {
            tracing::debug!("Skipping blank identifier in row {}", rows);
            continue;
        }

        if seen.insert(id.clone()) {
            units.push(WorkUnit::item(id));
        }
    }

    tracing::info!(
        "Loaded {} unique identifiers from {} rows of {}",
        units.len(),
        rows,
        path.display()
    );

    Ok(units)
}

/// Computes a SHA-256 fingerprint of a unit sequence
///
/// Two runs with the same fingerprint see the same units in the same order,
/// and therefore the same shard assignment.
pub fn fingerprint_units(units: &[WorkUnit]) -> String {
    let mut hasher = Sha256::new();
    for unit in units {
        hasher.update(unit.kind.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(unit.key().as_bytes());
        hasher.update([b'\n']);
    }
    hex::encode(hasher.finalize())
}
