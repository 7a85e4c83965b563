//! Chapter image adapter
//!
//! Turns one chapter identifier into one record per image on the chapter
//! page.

use crate::crawler::adapter::{FetchAdapter, FetchError};
use crate::crawler::fetcher::fetch_text;
use crate::crawler::parser::parse_chapter_images;
use crate::storage::Record;
use crate::unit::{UnitId, UnitKind, WorkUnit};
use crate::ConfigError;
use reqwest::Client;
use url::Url;

/// Column order of the image output
pub const IMAGE_COLUMNS: [&str; 3] = ["chapter_url", "image_n", "image_url"];

/// Fetches the image list of one chapter page
#[derive(Debug, Clone)]
pub struct ChapterImageAdapter {
    client: Client,
    /// Origin without a trailing slash; identifiers are appended below it
    base: String,
    referer: String,
}

impl ChapterImageAdapter {
    /// Creates the adapter for chapters hosted under `origin`
    ///
    /// `origin` may carry a path (`https://host/mirror`); chapters then
    /// resolve below that path.
    pub fn new(client: Client, origin: &str) -> Result<Self, ConfigError> {
        Url::parse(origin)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", origin, e)))?;

        Ok(Self {
            client,
            base: origin.trim_end_matches('/').to_string(),
            referer: origin.to_string(),
        })
    }

    /// Resolves a chapter identifier against the origin
    ///
    /// Absolute URLs (chapters hosted elsewhere) are used as they are.
    /// Relative identifiers are appended to the origin, path included, so
    /// they round-trip with [`normalize_identifier`](crate::unit::normalize_identifier).
    pub fn chapter_url(&self, id: &str) -> Result<Url, FetchError> {
        if let Ok(url) = Url::parse(id) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }

        let joined = format!("{}/{}", self.base, id.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| FetchError::Parse {
            url: joined.clone(),
            message: e.to_string(),
        })
    }
}

impl FetchAdapter for ChapterImageAdapter {
    fn kind(&self) -> UnitKind {
        UnitKind::ItemFetch
    }

    fn key_column(&self) -> &str {
        "chapter_url"
    }

    async fn fetch(&self, unit: &WorkUnit) -> Result<Vec<Record>, FetchError> {
        let id = match &unit.id {
            UnitId::Item(id) => id.as_str(),
            UnitId::Page(_) => {
                return Err(FetchError::UnsupportedUnit {
                    expected: self.kind(),
                    unit: unit.to_string(),
                })
            }
        };

        let url = self.chapter_url(id)?;
        let body = fetch_text(&self.client, &url, &self.referer).await?;

        let images = parse_chapter_images(&body).ok_or_else(|| FetchError::MissingContent {
            url: url.to_string(),
        })?;

        Ok(images
            .into_iter()
            .enumerate()
            .map(|(i, image_url)| {
                Record::new(id)
                    .with_field("chapter_url", id)
                    .with_field("image_n", (i + 1).to_string())
                    .with_field("image_url", image_url)
            })
            .collect())
    }
}
