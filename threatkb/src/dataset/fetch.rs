//! The bundle fetch boundary.
//!
//! The loader only supplies a URL and a timeout; transport lives behind the
//! [`BundleFetcher`] trait so tests can substitute an in-memory
//! implementation.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::stix::Bundle;

/// Fetch failures. All of these are fatal to the enclosing load.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid bundle body from {url}: {reason}")]
    InvalidBody { url: String, reason: String },
}

/// Fetches a raw bundle for a source.
#[async_trait]
pub trait BundleFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bundle, FetchError>;
}

/// HTTP fetcher backed by `reqwest`. One bounded request, no retries;
/// retry policy belongs to callers.
#[derive(Debug, Clone, Default)]
pub struct HttpBundleFetcher {
    client: reqwest::Client,
}

impl HttpBundleFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BundleFetcher for HttpBundleFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bundle, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Bundle>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::InvalidBody {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            } else {
                classify(url, e)
            }
        })
    }
}

fn classify(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            source: error,
        }
    }
}
