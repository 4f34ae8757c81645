//! Crawl statistics
//!
//! Counters are plain atomics shared by every crawl task; a
//! [`CrawlStatistics`] snapshot is taken once the root task is done.

use crate::document::DocumentKind;
use crate::state::NodeOutcome;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by all crawl tasks
#[derive(Debug, Default)]
pub struct CrawlCounters {
    cached: AtomicU64,
    saved: AtomicU64,
    missing: AtomicU64,
    failed: AtomicU64,
    branches: AtomicU64,
    leaves: AtomicU64,
    requests: AtomicU64,
    retries: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&self, outcome: NodeOutcome) {
        let counter = match outcome {
            NodeOutcome::Cached => &self.cached,
            NodeOutcome::Saved => &self.saved,
            NodeOutcome::Missing => &self.missing,
            NodeOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_kind(&self, kind: DocumentKind) {
        let counter = match kind {
            DocumentKind::Branch => &self.branches,
            DocumentKind::Leaf => &self.leaves,
            DocumentKind::Absent => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one HTTP request; `attempt` is 0 for the first try
    pub fn record_request(&self, attempt: u32) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if attempt > 0 {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn snapshot(
        &self,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        peak_in_flight: usize,
    ) -> CrawlStatistics {
        CrawlStatistics {
            started_at,
            finished_at,
            nodes_cached: self.cached.load(Ordering::Relaxed),
            nodes_saved: self.saved.load(Ordering::Relaxed),
            nodes_missing: self.missing.load(Ordering::Relaxed),
            nodes_failed: self.failed.load(Ordering::Relaxed),
            branches: self.branches.load(Ordering::Relaxed),
            leaves: self.leaves.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            peak_in_flight,
        }
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Nodes served from an existing artifact
    pub nodes_cached: u64,

    /// Nodes fetched and written
    pub nodes_saved: u64,

    /// Nodes confirmed absent
    pub nodes_missing: u64,

    /// Nodes left without an artifact, to be retried next run
    pub nodes_failed: u64,

    pub branches: u64,
    pub leaves: u64,

    /// HTTP requests sent, retries included
    pub requests: u64,
    pub retries: u64,

    /// Most fetches in flight at once
    pub peak_in_flight: usize,
}

impl CrawlStatistics {
    pub fn total_nodes(&self) -> u64 {
        self.nodes_cached + self.nodes_saved + self.nodes_missing + self.nodes_failed
    }

    /// Returns true if every visited node ended with an artifact
    pub fn is_complete(&self) -> bool {
        self.nodes_failed == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Started:  {}", stats.started_at.to_rfc3339());
    println!("  Finished: {}", stats.finished_at.to_rfc3339());
    println!("  Duration: {:.1}s", stats.duration_seconds());
    println!();

    println!("Nodes ({}):", stats.total_nodes());
    for (label, count) in [
        ("cached", stats.nodes_cached),
        ("saved", stats.nodes_saved),
        ("missing", stats.nodes_missing),
        ("error", stats.nodes_failed),
    ] {
        let percentage = if stats.total_nodes() > 0 {
            (count as f64 / stats.total_nodes() as f64) * 100.0
        } else {
            0.0
        };
        println!("  {:<8} {} ({:.1}%)", label, count, percentage);
    }
    println!("  branches: {}, leaves: {}", stats.branches, stats.leaves);
    println!();

    println!("Network:");
    println!("  Requests: {} ({} retries)", stats.requests, stats.retries);
    println!("  Peak in flight: {}", stats.peak_in_flight);
    println!();

    if stats.is_complete() {
        println!("Mirror is complete for every visited node");
    } else {
        println!(
            "{} node(s) failed and will be retried on the next run",
            stats.nodes_failed
        );
    }
}
