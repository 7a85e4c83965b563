//! Crawler module for unit execution and fetching
//!
//! This module contains the crawl core and its fetch adapters, including:
//! - The fetch adapter boundary and per-unit outcomes
//! - The bounded concurrent executor
//! - HTTP fetching and HTML parsing for catalog and chapter pages
//! - Overall run coordination

mod adapter;
mod catalog;
mod chapter;
mod coordinator;
mod executor;
mod fetcher;
mod outcome;
mod parser;

pub use adapter::{FetchAdapter, FetchError};
pub use catalog::{CatalogPageAdapter, CATALOG_COLUMNS};
pub use chapter::{ChapterImageAdapter, IMAGE_COLUMNS};
pub use coordinator::{run_harvest, Coordinator, RunPlan};
pub use executor::Executor;
pub use fetcher::{build_http_client, fetch_text};
pub use outcome::UnitOutcome;
pub use parser::{parse_catalog_page, parse_chapter_images, CatalogEntry, NOT_AVAILABLE};
