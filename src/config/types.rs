use crate::crawler::RetryPolicy;
use crate::locator::{
    RegionKind, RemoteEndpoints, DEFAULT_AREA_LOCAL_URL, DEFAULT_AREA_OVERSEAS_URL,
    DEFAULT_PRECINCT_URL, DEFAULT_RECORD_URL,
};
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Precinct-Mirror
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub remote: RemoteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight across the whole tree
    pub max_concurrent_fetches: u32,

    /// Deepest level whose listing is still recursed into
    pub max_depth: u32,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// First retry delay; doubles on every further retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Optional bound on the summed retry delays of one fetch (milliseconds)
    pub max_total_backoff_ms: Option<u64>,

    /// Timeout of a single request attempt (seconds)
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            max_depth: 5,
            max_retries: 5,
            initial_backoff_ms: 100,
            max_total_backoff_ms: None,
            request_timeout_secs: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            max_total_delay: self.max_total_backoff_ms.map(Duration::from_millis),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Remote service layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RemoteConfig {
    pub area_local_url: String,
    pub area_overseas_url: String,
    pub precinct_url: String,
    pub record_url: String,

    /// Which half of the hierarchy to walk
    pub region_kind: RegionKind,

    /// Code of the root listing
    pub start_code: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            area_local_url: DEFAULT_AREA_LOCAL_URL.to_string(),
            area_overseas_url: DEFAULT_AREA_OVERSEAS_URL.to_string(),
            precinct_url: DEFAULT_PRECINCT_URL.to_string(),
            record_url: DEFAULT_RECORD_URL.to_string(),
            region_kind: RegionKind::Local,
            start_code: "0".to_string(),
        }
    }
}

impl RemoteConfig {
    /// Parses the configured template bases
    pub fn endpoints(&self) -> ConfigResult<RemoteEndpoints> {
        RemoteEndpoints::parse(
            &self.area_local_url,
            &self.area_overseas_url,
            &self.precinct_url,
            &self.record_url,
        )
        .map_err(|e| ConfigError::InvalidUrl(e.to_string()))
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    pub crawler_name: String,
    pub crawler_version: String,

    /// Where the operator of this mirror can be reached
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "PrecinctMirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Format: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, contact),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory of the mirror
    pub mirror_root: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mirror_root: PathBuf::from("./data"),
        }
    }
}
