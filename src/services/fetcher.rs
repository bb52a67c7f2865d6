// src/services/fetcher.rs

//! Document retrieval boundary.
//!
//! The only component that touches the network. Retry policy deliberately
//! lives in the scheduler (a failed rule waits out its schedule period), so
//! the fetcher reports a classified error and nothing more.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, Result};
use crate::models::CrawlerConfig;

/// A fetched page, prior to any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// URL the document was requested from (base for link resolution)
    pub url: String,
    /// Raw response body
    pub body: String,
}

/// Retrieves raw document content for a rule's target URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<RawDocument, FetchError>;
}

/// Fetcher backed by a shared `reqwest` client with a bounded timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher from the crawler configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    fn classify(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
            };
        }
        if let Some(status) = error.status() {
            return FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        FetchError::Unreachable {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| Self::classify(url, e))?;
        Ok(RawDocument {
            url: url.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_default_config() {
        let config = CrawlerConfig::default();
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[test]
    fn test_fetch_error_kinds() {
        let timeout = FetchError::Timeout {
            url: "https://x".to_string(),
        };
        let status = FetchError::HttpStatus {
            url: "https://x".to_string(),
            status: 503,
        };
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(status.kind(), "http-status");
    }
}
