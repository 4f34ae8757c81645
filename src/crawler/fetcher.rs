//! HTTP fetcher implementation
//!
//! This module handles all requests to the remote service, including:
//! - Building the HTTP client with a proper user agent string
//! - Classifying response statuses
//! - Parsing and classifying payloads
//! - Retrying transient failures under the global fetch limiter
//!
//! # Status Classification
//!
//! | Condition | Result | Retried |
//! |-----------|--------|---------|
//! | HTTP 200, body is a JSON object | `Document` | - |
//! | HTTP 200, anything else | `Malformed` | no |
//! | HTTP 403 | `NotFound` | no |
//! | Any other status | `UnknownStatus` | yes |
//! | Connection / timeout / body read error | `Unreachable` | yes |
//! | Code unusable for its band | `InvalidLocator` | no, never sent |
//!
//! The service answers 403 both for resources that do not exist and when its
//! CDN blocks a request; the two cannot be told apart, so both mean absent.

use crate::config::UserAgentConfig;
use crate::crawler::retry::{retry, RetryPolicy};
use crate::crawler::scheduler::FetchLimiter;
use crate::document::Document;
use crate::locator::{locate, RegionKind, RemoteEndpoints};
use crate::output::CrawlCounters;
use crate::LocatorError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Status the service uses for a resource that does not exist
pub const ABSENT_STATUS: StatusCode = StatusCode::FORBIDDEN;

/// Ways a fetch can fail once retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} does not exist (HTTP 403)")]
    NotFound { url: String },

    #[error("unexpected HTTP {status} from {url}")]
    UnknownStatus { url: String, status: u16 },

    #[error("could not reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed payload from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("invalid locator: {0}")]
    InvalidLocator(#[from] LocatorError),

    #[error("fetch of {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// Returns true for failures worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UnknownStatus { .. } | Self::Unreachable { .. })
    }

    /// Returns true if the service confirmed the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Timeout of a single request attempt
///
/// # Example
///
/// ```no_run
/// use precinct_mirror::config::UserAgentConfig;
/// use precinct_mirror::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches and classifies documents from the remote service
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    endpoints: RemoteEndpoints,
    region_kind: RegionKind,
    policy: RetryPolicy,
    limiter: FetchLimiter,
}

impl Fetcher {
    pub fn new(
        client: Client,
        endpoints: RemoteEndpoints,
        region_kind: RegionKind,
        policy: RetryPolicy,
        limiter: FetchLimiter,
    ) -> Self {
        Self {
            client,
            endpoints,
            region_kind,
            policy,
            limiter,
        }
    }

    pub fn endpoints(&self) -> &RemoteEndpoints {
        &self.endpoints
    }

    pub fn region_kind(&self) -> RegionKind {
        self.region_kind
    }

    pub fn limiter(&self) -> &FetchLimiter {
        &self.limiter
    }

    /// Fetches the document for a node
    ///
    /// The locator is built first; a code it rejects fails with
    /// `InvalidLocator` before any permit is taken or request sent.
    pub async fn fetch_node(
        &self,
        code: &str,
        depth: u32,
        counters: &CrawlCounters,
    ) -> Result<Document, FetchError> {
        let url = locate(&self.endpoints, code, depth, self.region_kind)?;
        self.fetch(&url, counters).await
    }

    /// Fetches one locator with retries
    ///
    /// A single limiter permit is held across every attempt and backoff
    /// delay, and released when this returns, whatever the outcome.
    pub async fn fetch(&self, url: &Url, counters: &CrawlCounters) -> Result<Document, FetchError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .ok_or_else(|| FetchError::Cancelled {
                url: url.to_string(),
            })?;

        retry(&self.policy, FetchError::is_transient, |attempt| {
            counters.record_request(attempt);
            self.fetch_once(url)
        })
        .await
    }

    async fn fetch_once(&self, url: &Url) -> Result<Document, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Unreachable {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == ABSENT_STATUS {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }
        if status != StatusCode::OK {
            return Err(FetchError::UnknownStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Unreachable {
                url: url.to_string(),
                source,
            })?;

        Document::from_slice(&body).map_err(|e| FetchError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
