//! Work units and the pre-execution pipeline
//!
//! This module covers everything that happens before a single request is
//! sent:
//! - Producing the ordered unit sequence of a run (`source`)
//! - Splitting it into per-node shards (`partition`)
//! - Canonicalising identifiers so resumes compare like with like (`normalize`)
//! - Dropping units already present in the checkpoint store (`resume`)

mod normalize;
mod partition;
mod resume;
mod source;

pub use normalize::normalize_identifier;
pub use partition::{partition, shard_range};
pub use resume::{completed_keys, pending};
pub use source::{fingerprint_units, UnitSource};

use std::fmt;

/// The kind of work a unit represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// One page of the paginated catalog listing
    ListPage,

    /// One catalog item whose sub-resources are fetched
    ItemFetch,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListPage => "list-page",
            Self::ItemFetch => "item-fetch",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a work unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitId {
    Page(u32),
    Item(String),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{}", page),
            Self::Item(id) => f.write_str(id),
        }
    }
}

/// One discrete, independently fetchable item of crawl work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    pub id: UnitId,
    pub kind: UnitKind,
}

impl WorkUnit {
    /// A catalog list page
    pub fn page(page: u32) -> Self {
        Self {
            id: UnitId::Page(page),
            kind: UnitKind::ListPage,
        }
    }

    /// A catalog item, identified by an already normalized identifier
    pub fn item(id: impl Into<String>) -> Self {
        Self {
            id: UnitId::Item(id.into()),
            kind: UnitKind::ItemFetch,
        }
    }

    /// The value this unit is stored under in the checkpoint key column
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
