use crate::document::AreaNode;
use std::path::{Path, PathBuf};

/// Turns a node name into a single safe path segment
///
/// Path separators become `-` and surrounding whitespace is trimmed. The
/// result is deterministic so two runs over the same remote state agree on
/// every directory. `None` means the name cannot stand on its own (empty,
/// `.` or `..`).
///
/// # Examples
///
/// ```
/// use precinct_mirror::mirror::sanitize_segment;
///
/// assert_eq!(sanitize_segment(" NCR / Manila ").as_deref(), Some("NCR - Manila"));
/// assert_eq!(sanitize_segment("   "), None);
/// ```
pub fn sanitize_segment(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    let trimmed = replaced.trim();

    match trimmed {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}

/// Mirror directory of `node` below its parent's directory
///
/// Falls back to the node code when the name does not sanitize to a usable
/// segment.
pub fn child_dir(parent: &Path, node: &AreaNode) -> PathBuf {
    let segment = sanitize_segment(&node.name).unwrap_or_else(|| node.code.clone());
    parent.join(segment)
}
