//! File-backed JSON document storage.
//!
//! Every document lives in its own pretty-printed JSON file at
//! `{root}/{segment}/.../{last}.json`; file presence is the only source of
//! truth. Access to one document is serialized through the [`LockManager`]:
//! reads share the key, writes (`write`, `update`, `remove`,
//! `remove_existing`) own it.

mod key;

pub use key::StorageKey;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::fs::{write_atomic, TEMP_MARKER};
use crate::lock::LockManager;
use key::DOCUMENT_EXTENSION;

struct Inner {
    root: PathBuf,
    locks: LockManager,
    root_ready: OnceCell<()>,
}

/// Storage engine over one root directory.
///
/// Cloning is cheap and shares the lock table, so every clone observes the
/// same per-key exclusion.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Inner>,
}

impl Storage {
    pub fn new(config: &StoreConfig) -> Self {
        Self::at(config.root.clone())
    }

    /// Storage rooted at `root`; the directory is created on first access.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                locks: LockManager::new(),
                root_ready: OnceCell::new(),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub fn locks(&self) -> &LockManager {
        &self.inner.locks
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        key.to_path(&self.inner.root)
    }

    async fn ensure_root(&self) -> Result<()> {
        self.inner
            .root_ready
            .get_or_try_init(|| async {
                fs::create_dir_all(&self.inner.root).await?;
                info!(root = %self.inner.root.display(), "storage root ready");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    fn lock_name(target: &Path) -> String {
        target.to_string_lossy().into_owned()
    }

    /// Read and decode the document at `key`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when no file backs the key; any other I/O
    /// failure (including the path being a directory) is `StoreError::Io`.
    pub async fn read(&self, key: &StorageKey) -> Result<Value> {
        self.ensure_root().await?;
        let target = self.path_for(key);
        let _guard = self.inner.locks.read(&Self::lock_name(&target)).await;
        debug!(%key, "read document");
        let raw = fs::read(&target)
            .await
            .map_err(|e| StoreError::from_io(e, &target))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Create or overwrite the document at `key`.
    pub async fn write(&self, key: &StorageKey, document: &Value) -> Result<()> {
        self.ensure_root().await?;
        let target = self.path_for(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::from_io(e, parent))?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let _guard = self.inner.locks.write(&Self::lock_name(&target)).await;
        debug!(%key, bytes = bytes.len(), "write document");
        write_atomic(&target, &bytes)
            .await
            .map_err(|e| StoreError::from_io(e, &target))
    }

    /// Read, mutate and write back the document at `key` under one write lock.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when the key does not exist; nothing is created.
    pub async fn update<F>(&self, key: &StorageKey, mutate: F) -> Result<Value>
    where
        F: FnOnce(&mut Value) + Send,
    {
        self.try_update(key, |document| {
            mutate(document);
            Ok(())
        })
        .await
    }

    /// Like [`Storage::update`], but the mutation may fail; on failure
    /// nothing is written and the error is returned.
    pub async fn try_update<F>(&self, key: &StorageKey, mutate: F) -> Result<Value>
    where
        F: FnOnce(&mut Value) -> Result<()> + Send,
    {
        self.ensure_root().await?;
        let target = self.path_for(key);
        let _guard = self.inner.locks.write(&Self::lock_name(&target)).await;
        let raw = fs::read(&target)
            .await
            .map_err(|e| StoreError::from_io(e, &target))?;
        let mut document: Value = serde_json::from_slice(&raw)?;
        mutate(&mut document)?;
        let bytes = serde_json::to_vec_pretty(&document)?;
        debug!(%key, bytes = bytes.len(), "update document");
        write_atomic(&target, &bytes)
            .await
            .map_err(|e| StoreError::from_io(e, &target))?;
        Ok(document)
    }

    /// Delete the document at `key`. Missing documents are not an error and
    /// other failures are logged, not returned.
    pub async fn remove(&self, key: &StorageKey) -> Result<()> {
        self.ensure_root().await?;
        let target = self.path_for(key);
        let _guard = self.inner.locks.write(&Self::lock_name(&target)).await;
        match fs::remove_file(&target).await {
            Ok(()) => debug!(%key, "removed document"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(%key, error = %e, "failed to remove document"),
        }
        Ok(())
    }

    /// Delete the document at `key`, reporting whether it existed.
    ///
    /// The check and the removal happen under one write guard, so among
    /// concurrent callers at most one sees `true`. Unlike [`Storage::remove`]
    /// every failure other than a missing file is returned.
    pub async fn remove_existing(&self, key: &StorageKey) -> Result<bool> {
        self.ensure_root().await?;
        let target = self.path_for(key);
        let _guard = self.inner.locks.write(&Self::lock_name(&target)).await;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(%key, "removed document");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Every document key under `prefix`, sorted segment by segment.
    ///
    /// A missing prefix directory yields an empty list.
    pub async fn list(&self, prefix: &StorageKey) -> Result<Vec<StorageKey>> {
        self.ensure_root().await?;
        let mut keys = Vec::new();
        let mut pending = vec![(prefix.to_dir(&self.inner.root), prefix.segments().to_vec())];

        while let Some((dir, segments)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    let is_dir = fs::metadata(&dir)
                        .await
                        .map(|meta| meta.is_dir())
                        .unwrap_or(false);
                    if !is_dir {
                        continue;
                    }
                    return Err(StoreError::Io(e));
                }
            };

            while let Some(entry) = entries.next_entry().await? {
                let Ok(name) = entry.file_name().into_string() else {
                    debug!(dir = %dir.display(), "skipping non UTF-8 entry");
                    continue;
                };
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    let mut child = segments.clone();
                    child.push(name);
                    pending.push((entry.path(), child));
                } else if file_type.is_file() && !name.contains(TEMP_MARKER) {
                    if let Some(id) = name.strip_suffix(DOCUMENT_EXTENSION) {
                        if id.is_empty() {
                            continue;
                        }
                        let mut child = segments.clone();
                        child.push(id.to_string());
                        keys.push(StorageKey::from_trusted(child));
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("root", &self.inner.root)
            .finish()
    }
}
