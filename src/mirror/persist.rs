use crate::document::Document;
use crate::mirror::ArtifactKind;
use crate::MirrorError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

/// Writes a document into `dir` as the artifact for `code`
///
/// The file is written to a temporary file in the same directory and
/// persisted over the target, so a concurrent reader either sees the previous
/// artifact or the complete new one. Artifacts of the other two kinds for the
/// same code are removed afterwards, keeping one artifact per node.
///
/// # Arguments
///
/// * `document` - The classified document (`Absent` writes the sentinel)
/// * `dir` - The node's mirror directory; created if missing
/// * `code` - The node code used in the file name
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written artifact
/// * `Err(MirrorError)` - Directory creation, write or rename failed, or the
///   blocking write task died
pub async fn persist(
    document: &Document,
    dir: &Path,
    code: &str,
) -> Result<PathBuf, MirrorError> {
    let kind = ArtifactKind::for_document(document);
    let target = kind.path_in(dir, code);

    let bytes = document
        .to_json_vec()
        .map_err(|source| MirrorError::Serialize {
            path: target.clone(),
            source,
        })?;

    fs::create_dir_all(dir)
        .await
        .map_err(|e| MirrorError::io(dir, e))?;

    let write_dir = dir.to_path_buf();
    let write_target = target.clone();
    tokio::task::spawn_blocking(move || write_atomically(&write_dir, &write_target, &bytes))
        .await
        .map_err(|e| MirrorError::TaskPanicked {
            path: target.clone(),
            message: e.to_string(),
        })??;

    for other in ArtifactKind::ALL.into_iter().filter(|k| *k != kind) {
        let stale = other.path_in(dir, code);
        match fs::remove_file(&stale).await {
            Ok(()) => tracing::debug!("Removed stale artifact {}", stale.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MirrorError::io(&stale, e)),
        }
    }

    Ok(target)
}

/// Temp file in `dir`, then an atomic rename onto `target`
///
/// A temp file that never gets persisted is removed when dropped.
fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), MirrorError> {
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| MirrorError::io(dir, e))?;
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| MirrorError::io(dir, e))?;
    temp.persist(target)
        .map_err(|e| MirrorError::io(target, e.error))?;
    Ok(())
}
