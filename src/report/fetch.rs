//! Stats page retrieval.

use crate::config::ReportSource;
use thiserror::Error;

/// Errors that can occur while scraping the stats page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("stats endpoint returned HTTP {0}")]
    HttpStatus(u16),
    #[error("stats request failed: {0}")]
    Transport(String),
}

/// Source of raw report text.
///
/// Implemented over HTTP by [`HttpFetcher`]; tests substitute canned
/// responses.
pub trait ReportFetcher {
    /// Performs one scrape. No retries.
    fn fetch(&self, source: &ReportSource) -> Result<String, FetchError>;
}

/// Blocking HTTP scraper.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests give up after `source.timeout`.
    pub fn new(source: &ReportSource) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(source.timeout)
            .user_agent(concat!("haproxy-statsd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl ReportFetcher for HttpFetcher {
    fn fetch(&self, source: &ReportSource) -> Result<String, FetchError> {
        let mut request = self.client.get(&source.url);
        if let Some((user, password)) = source.credentials() {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        tracing::debug!(url = %source.url, bytes = body.len(), "Fetched stats report");

        Ok(strip_comment_marker(&body).to_string())
    }
}

/// Removes the `# ` prefix HAProxy puts in front of the CSV header.
///
/// Only one leading `#` is removed, together with the spaces after it.
pub fn strip_comment_marker(body: &str) -> &str {
    match body.strip_prefix('#') {
        Some(rest) => rest.trim_start_matches(' '),
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comment_marker() {
        assert_eq!(strip_comment_marker("# pxname,svname\n"), "pxname,svname\n");
        assert_eq!(strip_comment_marker("#pxname"), "pxname");
        assert_eq!(strip_comment_marker("#   pxname"), "pxname");
    }

    #[test]
    fn test_strip_only_one_marker() {
        assert_eq!(strip_comment_marker("## pxname"), "# pxname");
    }

    #[test]
    fn test_no_marker_untouched() {
        assert_eq!(strip_comment_marker("pxname,svname"), "pxname,svname");
        assert_eq!(strip_comment_marker(" # pxname"), " # pxname");
    }
}
