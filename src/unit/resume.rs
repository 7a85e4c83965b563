//! Resume filter
//!
//! Drops the shard units whose normalized key is already in the checkpoint
//! store, so a restarted node only fetches what is still missing.

use crate::unit::{normalize_identifier, UnitKind, WorkUnit};
use std::collections::HashSet;
use url::Url;

/// Removes units whose key is already present in the checkpoint store
///
/// Runs in time linear in `shard_units.len() + completed.len()`; the relative
/// order of the remaining units is preserved.
///
/// # Arguments
///
/// * `shard_units` - The units assigned to this node
/// * `completed` - Normalized keys already present in the checkpoint store
///
/// # Returns
///
/// The units that still need to be fetched
pub fn pending(shard_units: &[WorkUnit], completed: &HashSet<String>) -> Vec<WorkUnit> {
    let mut remaining = Vec::with_capacity(shard_units.len());

    for unit in shard_units {
        if completed.contains(&unit.key()) {
            tracing::info!("Skipping {} as it already exists in the checkpoint store", unit);
            continue;
        }
        remaining.push(unit.clone());
    }

    tracing::info!(
        "Resume filter: {} of {} shard units already completed, {} remaining",
        shard_units.len() - remaining.len(),
        shard_units.len(),
        remaining.len()
    );

    remaining
}

/// Normalizes raw checkpoint keys into the set used by [`pending`]
pub fn completed_keys<I, S>(raw_keys: I, kind: UnitKind, origin: Option<&Url>) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw_keys
        .into_iter()
        .map(|key| normalize_identifier(key.as_ref(), kind, origin))
        .filter(|key| !key.is_empty())
        .collect()
}
