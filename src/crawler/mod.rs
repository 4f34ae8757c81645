//! Crawler module for mirroring the remote hierarchy
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with status classification and retries
//! - The retry schedule itself
//! - Global limiting of in-flight fetches
//! - Recursive crawl coordination

mod coordinator;
mod fetcher;
mod retry;
mod scheduler;

pub use coordinator::{
    absorb_not_found, CompletionCallback, Coordinator, CrawlTask, NodeCompletion,
};
pub use fetcher::{build_http_client, FetchError, Fetcher, ABSENT_STATUS};
pub use retry::{retry, RetryPolicy};
pub use scheduler::{FetchLimiter, FetchPermit};

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::MirrorError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and fetch limiter
/// 2. Start at the configured root listing
/// 3. Walk every branch, skipping nodes already in the mirror
/// 4. Return statistics for the run
///
/// # Example
///
/// ```no_run
/// use precinct_mirror::config::load_config;
/// use precinct_mirror::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("mirror.toml"))?;
/// let stats = crawl(config).await?;
/// println!("{} nodes saved", stats.nodes_saved);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlStatistics, MirrorError> {
    Coordinator::new(config)?.run().await
}
