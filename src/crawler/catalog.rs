//! Catalog list page adapter

use crate::config::SourceConfig;
use crate::crawler::adapter::{FetchAdapter, FetchError};
use crate::crawler::fetcher::fetch_text;
use crate::crawler::parser::{parse_catalog_page, CatalogEntry};
use crate::storage::Record;
use crate::unit::{UnitId, UnitKind, WorkUnit};
use crate::ConfigError;
use reqwest::Client;
use url::Url;

/// Column order of the list output
pub const CATALOG_COLUMNS: [&str; 8] = [
    "page",
    "title",
    "url",
    "chapters",
    "views",
    "comments",
    "cover_image_url",
    "description",
];

/// Fetches one page of the paginated catalog listing
#[derive(Debug, Clone)]
pub struct CatalogPageAdapter {
    client: Client,
    list_url: Url,
    referer: String,
    list_key: String,
    order_by: String,
}

impl CatalogPageAdapter {
    /// Creates the adapter for the list endpoint described by `source`
    ///
    /// The list path is appended to the origin, so an origin with a path
    /// (`https://host/mirror`) keeps it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the origin or list path do not
    /// form a valid URL.
    pub fn new(client: Client, source: &SourceConfig) -> Result<Self, ConfigError> {
        Url::parse(&source.origin).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", source.origin, e))
        })?;
        let joined = format!(
            "{}/{}",
            source.origin.trim_end_matches('/'),
            source.list_path.trim_start_matches('/')
        );
        let list_url = Url::parse(&joined).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid list path '{}': {}", source.list_path, e))
        })?;

        Ok(Self {
            client,
            list_url,
            referer: source.origin.clone(),
            list_key: source.list_key.clone(),
            order_by: source.order_by.clone(),
        })
    }

    /// URL of the given list page
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.list_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("key", &self.list_key)
            .append_pair("orderBy", &self.order_by)
            .append_pair("p", &page.to_string());
        url
    }
}

impl FetchAdapter for CatalogPageAdapter {
    fn kind(&self) -> UnitKind {
        UnitKind::ListPage
    }

    fn key_column(&self) -> &str {
        "page"
    }

    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<Record>, FetchError> {
        let page = match unit.id {
            UnitId::Page(page) => page,
            UnitId::Item(_) => {
                return Err(FetchError::UnsupportedUnit {
                    expected: self.kind(),
                    unit: unit.to_string(),
                })
            }
        };

        let url = self.page_url(page);
        let body = fetch_text(&self.client, &url, &self.referer).await?;
        let entries = parse_catalog_page(&body);

        tracing::debug!("Page {} listed {} entries", page, entries.len());

        Ok(entries
            .into_iter()
            .map(|entry| entry_record(page, entry))
            .collect())
    }
}

fn entry_record(page: u32, entry: CatalogEntry) -> Record {
    let key = page.to_string();
    Record::new(key.clone())
        .with_field("page", key)
        .with_field("title", entry.title)
        .with_field("url", entry.url)
        .with_field("chapters", entry.chapters)
        .with_field("views", entry.views)
        .with_field("comments", entry.comments)
        .with_field("cover_image_url", entry.cover_image_url)
        .with_field("description", entry.description)
}
