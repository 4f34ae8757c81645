use std::fmt;

/// How a node's crawl task ended
///
/// The first three are durable: the node has an artifact on disk and will be
/// skipped by the next run. `Failed` leaves nothing behind so the next run
/// retries the whole node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOutcome {
    /// Served from an existing artifact; no fetch, no write
    Cached,

    /// Fetched and written to the mirror
    Saved,

    /// Confirmed absent; the missing sentinel was written
    Missing,

    /// Transient or malformed fetch; nothing written
    Failed,
}

impl NodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Saved => "saved",
            Self::Missing => "missing",
            Self::Failed => "error",
        }
    }

    /// Returns true if the node now has a durable artifact
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl fmt::Display for NodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
