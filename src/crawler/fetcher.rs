//! HTTP fetcher implementation
//!
//! This module handles the transport side of the fetch adapters:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Sending GET requests with the origin as referer
//! - Classifying transport errors and non-success statuses

use crate::config::FetcherConfig;
use crate::crawler::adapter::FetchError;
use reqwest::header::REFERER;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::FetcherConfig;
/// use catalog_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body as text
///
/// # Error Mapping
///
/// | Condition | Error |
/// |-----------|-------|
/// | Timeout | `FetchError::Timeout` |
/// | Connection or other transport error | `FetchError::Http` |
/// | Non-2xx status | `FetchError::Status` |
/// | Body cannot be decoded | `FetchError::Http` |
///
/// No retries happen here; a failed unit is simply pending again on the
/// next run.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch, including any query
/// * `referer` - Value of the `Referer` header
pub async fn fetch_text(client: &Client, url: &Url, referer: &str) -> Result<String, FetchError> {
    let url_str = url.as_str();
    tracing::debug!("GET {}", url_str);

    let response = client
        .get(url.clone())
        .header(REFERER, referer)
        .send()
        .await
        .map_err(|e| classify_error(url_str, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url_str.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| classify_error(url_str, e))
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
