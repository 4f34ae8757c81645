//! Configuration module for Precinct-Mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key is optional; an empty file crawls the local half of
//! the 2025 results service into `./data`.
//!
//! # Example
//!
//! ```no_run
//! use precinct_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Fetching with at most {} requests in flight", config.crawler.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, RemoteConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
