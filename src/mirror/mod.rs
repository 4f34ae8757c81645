//! Local mirror of the remote hierarchy
//!
//! This module handles everything that touches the mirror directory tree:
//! - Deriving a node's directory from its parent and sanitized name
//! - Naming artifacts by document kind
//! - Atomic persistence of documents
//! - The resume guard that short-circuits nodes already on disk
//!
//! Each node owns one directory and holds at most one artifact in it:
//!
//! ```text
//! root/_INFO.0.json
//! root/Region A/_INFO.01.json
//! root/Region A/Province A/RECORD.0101.json
//! root/Region A/Province B/_MISSING.0102.json
//! ```

mod cache;
mod paths;
mod persist;

pub use cache::{check_cache, CacheLookup};
pub use paths::{child_dir, sanitize_segment};
pub use persist::persist;

use crate::document::{Document, DocumentKind};
use std::path::{Path, PathBuf};

/// The three artifact kinds a node can leave in the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Listing of a branch node
    Info,
    /// Terminal record of a leaf node
    Record,
    /// Sentinel for a node confirmed absent
    Missing,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Info, Self::Record, Self::Missing];

    pub fn for_document(document: &Document) -> Self {
        match document.kind() {
            DocumentKind::Branch => Self::Info,
            DocumentKind::Leaf => Self::Record,
            DocumentKind::Absent => Self::Missing,
        }
    }

    /// File name prefix; the leading underscore keeps bookkeeping files apart
    /// from records in a directory listing.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Info => "_INFO",
            Self::Record => "RECORD",
            Self::Missing => "_MISSING",
        }
    }

    pub fn file_name(&self, code: &str) -> String {
        format!("{}.{}.json", self.prefix(), code)
    }

    pub fn path_in(&self, dir: &Path, code: &str) -> PathBuf {
        dir.join(self.file_name(code))
    }

    /// Recognizes an artifact file name, returning its kind and node code
    pub fn parse_file_name(name: &str) -> Option<(Self, &str)> {
        let stem = name.strip_suffix(".json")?;
        Self::ALL.into_iter().find_map(|kind| {
            stem.strip_prefix(kind.prefix())
                .and_then(|rest| rest.strip_prefix('.'))
                .filter(|code| !code.is_empty())
                .map(|code| (kind, code))
        })
    }
}
