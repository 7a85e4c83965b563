//! HTML parsers for catalog list pages and chapter pages
//!
//! These functions are pure: markup in, structured entries out. The adapters
//! turn the entries into records.

use scraper::{ElementRef, Html, Selector};

/// Placeholder used when a list entry lacks a numeric column
pub const NOT_AVAILABLE: &str = "N/A";

/// One catalog entry extracted from a list page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
    pub chapters: String,
    pub views: String,
    pub comments: String,
    pub cover_image_url: String,
    pub description: String,
}

/// Parses the entries of one catalog list page
///
/// # Extraction Rules
///
/// - An entry is a `<p>` containing a `span.tiptip.fs-12.ellipsis`
/// - Title and URL come from the entry's first `<a>` (`No Title` / `No URL`
///   when absent)
/// - The texts of the other `span.fs-12` elements become chapters, views and
///   comments, padded with `N/A`
/// - The anchor's parent names a hidden tooltip `div` via `data-tiptip`; its
///   first `img[src]` is the cover (`No Image`) and its text the description
///   (`No Description`)
///
/// # Example
///
/// ```
/// use catalog_harvest::crawler::parse_catalog_page;
///
/// let html = r#"
///     <p><span class="tiptip fs-12 ellipsis" data-tiptip="t1"><a href="/m1">Manga</a></span>
///        <span class="fs-12">10</span><span class="fs-12">200</span><span class="fs-12">3</span></p>
///     <div id="t1"><img src="https://img/c.jpg"/>A story</div>
/// "#;
/// let entries = parse_catalog_page(html);
/// assert_eq!(entries[0].title, "Manga");
/// assert_eq!(entries[0].views, "200");
/// ```
pub fn parse_catalog_page(html: &str) -> Vec<CatalogEntry> {
    let document = Html::parse_document(html);

    let (Ok(p_sel), Ok(marker_sel), Ok(a_sel), Ok(span_sel), Ok(div_sel), Ok(img_sel)) = (
        Selector::parse("p"),
        Selector::parse("span.tiptip.fs-12.ellipsis"),
        Selector::parse("a"),
        Selector::parse("span.fs-12"),
        Selector::parse("div[id]"),
        Selector::parse("img[src]"),
    ) else {
        return Vec::new();
    };

    let mut entries = Vec::new();

    for element in document.select(&p_sel) {
        if element.select(&marker_sel).next().is_none() {
            continue;
        }

        let anchor = element.select(&a_sel).next();
        let title = anchor
            .map(stripped_text)
            .unwrap_or_else(|| "No Title".to_string());
        let url = anchor
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.to_string())
            .unwrap_or_else(|| "No URL".to_string());

        let mut numbers: Vec<String> = element
            .select(&span_sel)
            .filter(|span| !span.value().classes().any(|c| c == "ellipsis"))
            .map(stripped_text)
            .collect();
        while numbers.len() < 3 {
            numbers.push(NOT_AVAILABLE.to_string());
        }

        let tooltip = anchor
            .and_then(|a| a.parent())
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.value().attr("data-tiptip"))
            .and_then(|id| {
                document
                    .select(&div_sel)
                    .find(|div| div.value().id() == Some(id))
            });

        let cover_image_url = tooltip
            .and_then(|div| div.select(&img_sel).next())
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.to_string())
            .unwrap_or_else(|| "No Image".to_string());
        let description = tooltip
            .map(stripped_text)
            .unwrap_or_else(|| "No Description".to_string());

        let mut numbers = numbers.into_iter();
        entries.push(CatalogEntry {
            title,
            url,
            chapters: numbers.next().unwrap_or_default(),
            views: numbers.next().unwrap_or_default(),
            comments: numbers.next().unwrap_or_default(),
            cover_image_url,
            description,
        });
    }

    entries
}

/// Extracts the image URLs of a chapter page
///
/// # Returns
///
/// * `None` - The page has no `article#content` element
/// * `Some(urls)` - The `src` (or `data-src`) of every image inside it, in
///   document order
pub fn parse_chapter_images(html: &str) -> Option<Vec<String>> {
    let document = Html::parse_document(html);

    let content_sel = Selector::parse("article#content").ok()?;
    let img_sel = Selector::parse("img").ok()?;

    let content = document.select(&content_sel).next()?;

    let urls: Vec<String> = content
        .select(&img_sel)
        .filter_map(|img| {
            let src = img
                .value()
                .attr("src")
                .or_else(|| img.value().attr("data-src"))
                .map(str::trim)
                .filter(|s| !s.is_empty());
            if src.is_none() {
                tracing::trace!("Skipping image without a source");
            }
            src.map(|s| s.to_string())
        })
        .collect();

    Some(urls)
}

/// Concatenates an element's text nodes, each trimmed, dropping empty ones
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
