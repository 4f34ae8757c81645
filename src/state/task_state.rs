use crate::document::DocumentKind;
use std::fmt;

/// Lifecycle states of a single crawl task
///
/// ```text
/// Init -> CacheHit ------------------------> Classified -> Recursing -> Done
///      -> CacheMiss -> Fetching -> Classified -> Persisting -> Recursing -> Done
/// ```
///
/// Recursing is only entered for branches; leaves and absent nodes go from
/// `Persisting` (or straight from `Classified` on a cache hit) to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task created, nothing checked yet
    Init,

    /// A persisted artifact was found for the node
    CacheHit,

    /// No usable artifact on disk
    CacheMiss,

    /// Waiting on the remote service (including retries)
    Fetching,

    /// Document shape decided
    Classified(DocumentKind),

    /// Writing the artifact to the mirror
    Persisting,

    /// Waiting for every child task to finish
    Recursing,

    // ===== Terminal States =====
    /// Finished, with or without recursion
    Done,

    /// Ended without an artifact, or a child task could not be joined
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        match (*self, next) {
            (Init, CacheHit) | (Init, CacheMiss) => true,
            (CacheHit, Classified(_)) => true,
            (CacheMiss, Fetching) => true,
            (Fetching, Classified(_)) => true,
            (Classified(_), Persisting) => true,
            (Classified(DocumentKind::Branch), Recursing) => true,
            (Classified(DocumentKind::Leaf), Done) | (Classified(DocumentKind::Absent), Done) => {
                true
            }
            (Persisting, Recursing) | (Persisting, Done) => true,
            (Recursing, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::CacheHit => write!(f, "cache_hit"),
            Self::CacheMiss => write!(f, "cache_miss"),
            Self::Fetching => write!(f, "fetching"),
            Self::Classified(kind) => write!(f, "classified({:?})", kind),
            Self::Persisting => write!(f, "persisting"),
            Self::Recursing => write!(f, "recursing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
