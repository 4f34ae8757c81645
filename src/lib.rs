//! Precinct-Mirror: a resumable mirror of a remote election-results hierarchy
//!
//! This crate walks the region → province/district → city/municipality →
//! barangay → precinct hierarchy published by a remote JSON service and
//! mirrors every listing and precinct record onto a local directory tree.
//! Re-running a crawl over a partially populated mirror only fetches what is
//! still missing.

pub mod config;
pub mod crawler;
pub mod document;
pub mod locator;
pub mod mirror;
pub mod output;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Precinct-Mirror operations
///
/// Per-node fetch failures never surface here; they are absorbed by the
/// coordinator. What remains are conditions that should stop the run.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize document for {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Crawl task for {} did not complete: {message}", path.display())]
    TaskPanicked { path: PathBuf, message: String },
}

impl MirrorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors building a remote locator from a node code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Node code is empty")]
    EmptyCode,

    #[error("Node code '{code}' contains characters outside [0-9A-Za-z]")]
    InvalidCode { code: String },

    #[error("Node code '{code}' is shorter than the {required}-character prefix needed at depth {depth}")]
    CodeTooShort {
        code: String,
        required: usize,
        depth: u32,
    },

    #[error("Invalid endpoint base '{base}': {message}")]
    InvalidBase { base: String, message: String },

    #[error("Failed to join '{code}' onto {base}: {message}")]
    Join {
        base: String,
        code: String,
        message: String,
    },
}

/// Result type alias for Precinct-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for locator operations
pub type LocatorResult<T> = std::result::Result<T, LocatorError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlTask, FetchError};
pub use document::{AreaDocument, AreaNode, Document, RecordDocument};
pub use locator::{locate, Level, RegionKind, RemoteEndpoints};
pub use state::{NodeOutcome, TaskState};
