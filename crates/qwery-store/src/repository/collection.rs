//! Typed access to one entity type's documents.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::storage::{Storage, StorageKey};

/// Storage keyed under one entity prefix (`[entity, ...]`).
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    storage: Storage,
    entity: &'static str,
    label: &'static str,
}

impl Collection {
    /// `entity` is the key prefix, `label` the name used in errors.
    pub(crate) fn new(storage: Storage, entity: &'static str, label: &'static str) -> Self {
        Self {
            storage,
            entity,
            label,
        }
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }

    pub(crate) fn prefix(&self) -> Result<StorageKey> {
        StorageKey::new([self.entity])
    }

    pub(crate) fn key(&self, id: &str) -> Result<StorageKey> {
        StorageKey::new([self.entity, id])
    }

    /// Decode the document at `key`; `None` when it does not exist.
    pub(crate) async fn get<T: DeserializeOwned>(&self, key: &StorageKey) -> Result<Option<T>> {
        match self.storage.read(key).await {
            Ok(document) => Ok(Some(serde_json::from_value(document)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn find<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        self.get(&self.key(id)?).await
    }

    /// Decode every document under `prefix` whose key has `depth` segments,
    /// in key order. Documents removed mid-scan are skipped.
    pub(crate) async fn scan<T: DeserializeOwned>(
        &self,
        prefix: &StorageKey,
        depth: usize,
    ) -> Result<Vec<T>> {
        let keys = self.storage.list(prefix).await?;
        let mut items = Vec::with_capacity(keys.len());
        for key in keys.iter().filter(|key| key.len() == depth) {
            if let Some(item) = self.get(key).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Every `[entity, id]` document.
    pub(crate) async fn all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.scan(&self.prefix()?, 2).await
    }

    pub(crate) async fn insert<T: Serialize>(&self, key: &StorageKey, entity: &T) -> Result<()> {
        let document = serde_json::to_value(entity)?;
        self.storage.write(key, &document).await
    }

    /// Overwrite an existing document; never creates one.
    pub(crate) async fn replace<T: Serialize>(
        &self,
        key: &StorageKey,
        id: &str,
        entity: &T,
    ) -> Result<()> {
        let row = serde_json::to_value(entity)?;
        self.replace_with(key, id, move |document| {
            *document = row;
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Mutate an existing document under its write lock.
    ///
    /// # Errors
    ///
    /// `StoreError::EntityNotFound` when `key` has no document.
    pub(crate) async fn replace_with<F>(&self, key: &StorageKey, id: &str, mutate: F) -> Result<Value>
    where
        F: FnOnce(&mut Value) -> Result<()> + Send,
    {
        self.storage
            .try_update(key, mutate)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => self.not_found(id),
                other => other,
            })
    }

    /// Remove the document at `key`; `false` when it was already absent.
    pub(crate) async fn delete(&self, key: &StorageKey) -> Result<bool> {
        self.storage.remove_existing(key).await
    }

    pub(crate) fn not_found(&self, id: &str) -> StoreError {
        StoreError::EntityNotFound {
            entity: self.label,
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(&self, id: &str) -> StoreError {
        StoreError::AlreadyExists {
            entity: self.label,
            id: id.to_string(),
        }
    }
}
