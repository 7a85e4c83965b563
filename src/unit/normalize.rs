//! Identifier normalization
//!
//! The unit source and the checkpoint store both pass identifiers through
//! [`normalize_identifier`] before they are compared.

use crate::unit::UnitKind;
use percent_encoding::percent_decode_str;
use url::Url;

/// Canonicalises a unit identifier so that the same unit always compares equal
///
/// The checkpoint store and the unit source may spell one identifier in
/// different ways (a page written as `"007"`, a chapter link with or without
/// the site origin). Both sides of the resume comparison go through this
/// function.
///
/// # Rules
///
/// **List pages:**
/// - Surrounding whitespace is trimmed
/// - Integral numbers lose leading zeros and a zero fraction (`"007"` and
///   `"7.0"` both become `"7"`)
///
/// **Items:**
/// - Surrounding whitespace is trimmed
/// - Absolute URLs on the origin host (ignoring case and a `www.` prefix) are
///   reduced to their path and query, relative to the origin's own path
/// - Percent-escapes are decoded, so `a%20b` and `a b` are the same item
/// - Fragments are dropped
/// - Leading and trailing slashes of relative identifiers are removed
///
/// Anything that does not match these shapes is returned trimmed and
/// otherwise untouched.
///
/// # Examples
///
/// ```
/// use catalog_harvest::unit::{normalize_identifier, UnitKind};
/// use url::Url;
///
/// let origin = Url::parse("https://example.com").unwrap();
/// assert_eq!(normalize_identifier(" 007 ", UnitKind::ListPage, None), "7");
/// assert_eq!(
///     normalize_identifier("https://www.example.com/c12/ch-1/#top", UnitKind::ItemFetch, Some(&origin)),
///     "c12/ch-1"
/// );
/// ```
pub fn normalize_identifier(raw: &str, kind: UnitKind, origin: Option<&Url>) -> String {
    let trimmed = raw.trim();

    match kind {
        UnitKind::ListPage => canonical_integer(trimmed).unwrap_or_else(|| trimmed.to_string()),
        UnitKind::ItemFetch => normalize_item(trimmed, origin),
    }
}

/// Returns the canonical decimal form of an integral number, if `s` is one
fn canonical_integer(s: &str) -> Option<String> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (s, ""),
    };

    if int_part.is_empty()
        || !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c == '0')
    {
        return None;
    }

    let stripped = int_part.trim_start_matches('0');
    if stripped.is_empty() {
        Some("0".to_string())
    } else {
        Some(stripped.to_string())
    }
}

fn normalize_item(s: &str, origin: Option<&Url>) -> String {
    if let Ok(mut url) = Url::parse(s) {
        if url.scheme() == "http" || url.scheme() == "https" {
            url.set_fragment(None);

            let same_host = match (origin.and_then(|o| o.host_str()), url.host_str()) {
                (Some(origin_host), Some(host)) => bare_host(origin_host) == bare_host(host),
                _ => false,
            };

            if let (true, Some(origin)) = (same_host, origin) {
                if let Some(path) = strip_origin_path(url.path(), origin.path()) {
                    let mut relative = path.to_string();
                    if let Some(query) = url.query() {
                        relative.push('?');
                        relative.push_str(query);
                    }
                    return decode(&trim_slashes(&relative));
                }
            }

            return url.to_string();
        }
    }

    let without_fragment = match s.split_once('#') {
        Some((before, _)) => before,
        None => s,
    };
    decode(&trim_slashes(without_fragment))
}

/// Removes the origin's own path (e.g. `/mirror`) from the front of `path`
///
/// Returns `None` when `path` lies outside the origin's path.
fn strip_origin_path<'a>(path: &'a str, origin_path: &str) -> Option<&'a str> {
    let prefix = origin_path.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }

    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Decodes percent-escapes so encoded and literal spellings agree
fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Lowercases a host and drops a leading `www.`
fn bare_host(host: &str) -> String {
    let lower = host.to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

fn trim_slashes(s: &str) -> String {
    s.trim_start_matches('/').trim_end_matches('/').to_string()
}
