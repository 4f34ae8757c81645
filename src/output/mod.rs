//! Output module for crawl statistics and mirror audits
//!
//! This module handles:
//! - Counting node outcomes and network activity during a crawl
//! - Rendering the end-of-run summary
//! - Scanning an existing mirror for its artifacts

mod inventory;
pub mod stats;

pub use inventory::{print_inventory, scan_mirror, MirrorInventory};
pub use stats::{print_statistics, CrawlCounters, CrawlStatistics};
