//! Contiguous shard assignment
//!
//! Units are split by position, never by hashing, so the assignment of a run
//! can be audited from the unit sequence alone. For `len = q * n + r` units
//! and `n` nodes, the first `r` nodes receive `q + 1` units and the remaining
//! nodes receive `q`.

use crate::ConfigError;
use std::ops::Range;

/// Computes the index range of the units assigned to `node_index`
///
/// # Arguments
///
/// * `len` - Total number of units in the run
/// * `node_count` - Number of participating nodes
/// * `node_index` - Index of this node in `[0, node_count)`
///
/// # Returns
///
/// * `Ok(Range<usize>)` - The contiguous block owned by this node (possibly empty)
/// * `Err(ConfigError::InvalidShard)` - `node_count` is zero or `node_index` is out of range
pub fn shard_range(
    len: usize,
    node_count: usize,
    node_index: usize,
) -> Result<Range<usize>, ConfigError> {
    if node_count == 0 || node_index >= node_count {
        return Err(ConfigError::InvalidShard {
            node_count,
            node_index,
        });
    }

    let base = len / node_count;
    let remainder = len % node_count;

    let start = node_index * base + node_index.min(remainder);
    let size = base + usize::from(node_index < remainder);

    Ok(start..start + size)
}

/// Returns the shard of `units` owned by `node_index`
///
/// # Example
///
/// ```
/// use catalog_harvest::unit::partition;
///
/// let units = [1, 2, 3, 4, 5, 6];
/// assert_eq!(partition(&units, 2, 0).unwrap(), &[1, 2, 3]);
/// assert_eq!(partition(&units, 2, 1).unwrap(), &[4, 5, 6]);
/// ```
pub fn partition<T>(units: &[T], node_count: usize, node_index: usize) -> Result<&[T], ConfigError> {
    let range = shard_range(units.len(), node_count, node_index)?;
    Ok(&units[range])
}
