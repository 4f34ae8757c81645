//! Resume guard
//!
//! Probes the mirror for an artifact left by an earlier run. Any failure to
//! read or parse one is treated as "not cached" and the node is fetched
//! again; the guard never fails a task.

use crate::document::{Document, DocumentKind};
use crate::mirror::ArtifactKind;
use std::path::Path;
use tokio::fs;

/// Result of probing the mirror for a node
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// A complete artifact exists; the document it holds
    Hit(Document),
    NotCached,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Looks for an info, record or missing artifact for `code` in `dir`
///
/// Checked in that order. An info file must still parse as a listing and a
/// record file as a record; a file whose contents no longer match its name is
/// ignored. The missing sentinel only needs to be readable.
pub async fn check_cache(dir: &Path, code: &str) -> CacheLookup {
    for kind in ArtifactKind::ALL {
        let path = kind.path_in(dir, code);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!("Ignoring unreadable artifact {}: {}", path.display(), e);
                }
                continue;
            }
        };

        if kind == ArtifactKind::Missing {
            return CacheLookup::Hit(Document::Absent);
        }

        let expected = match kind {
            ArtifactKind::Info => DocumentKind::Branch,
            _ => DocumentKind::Leaf,
        };
        match Document::from_slice(&bytes) {
            Ok(document) if document.kind() == expected => return CacheLookup::Hit(document),
            Ok(document) => tracing::debug!(
                "Ignoring {}: holds a {:?} document",
                path.display(),
                document.kind()
            ),
            Err(e) => tracing::debug!("Ignoring corrupt artifact {}: {}", path.display(), e),
        }
    }

    CacheLookup::NotCached
}
