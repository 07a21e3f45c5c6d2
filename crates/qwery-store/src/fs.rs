//! Filesystem utilities for atomic document writes.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

/// Suffix marking in-flight temporary files; never a document.
pub(crate) const TEMP_MARKER: &str = ".tmp-";

/// Write `contents` to `destination` through a sibling temp file and a rename.
///
/// Readers either see the previous document or the new one, never a
/// truncated file. The temp file is removed if the write or rename fails.
pub async fn write_atomic(destination: &Path, contents: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(destination);
    if let Err(err) = fs::write(&temp_path, contents).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err);
    }
    rename_with_fallback(&temp_path, destination).await
}

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub async fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination).await {
        // A directory in the way is not something removing a file can fix.
        if fs::metadata(destination)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            let _ = fs::remove_file(temp_path).await;
            return Err(initial_err);
        }
        let _ = fs::remove_file(destination).await;
        if let Err(retry_err) = fs::rename(temp_path, destination).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            ));
        }
    }
    Ok(())
}

fn temp_path_for(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!("{}{}{}", name, TEMP_MARKER, Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_atomic_new_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest.json");

        write_atomic(&dest, b"test").await.unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "test");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().contains(TEMP_MARKER))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_write_atomic_overwrites_existing() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest.json");
        std::fs::write(&dest, b"old").unwrap();

        write_atomic(&dest, b"new").await.unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_write_atomic_onto_directory_fails_and_cleans_up() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("taken.json");
        std::fs::create_dir(&dest).unwrap();

        assert!(write_atomic(&dest, b"data").await.is_err());
        assert!(dest.is_dir());
        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }
}
