//! Repository trait definition.
//!
//! The `Repository` trait is the typed CRUD contract every entity adapter
//! implements on top of the storage engine. Callers work with entities and
//! never touch storage keys, locks or the vault directly.

use async_trait::async_trait;

use super::FindOptions;
use crate::error::Result;

/// Typed persistence for one entity type.
///
/// All implementations must ensure:
/// - `create` assigns an id, slug and actor fields the caller left empty
/// - `update` never upserts
/// - lookups report absence as `Ok(None)`, not as an error
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Every entity, ordered per entity type, with offset/limit applied.
    async fn find_all(&self, options: FindOptions) -> Result<Vec<T>>;

    /// Get an entity by id.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(entity))` if found, `Ok(None)` if not found.
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Get an entity by its slug. Entities without slugs always return `None`.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<T>>;

    /// Persist a new entity.
    ///
    /// # Returns
    ///
    /// Returns the entity as stored, with its assigned id and slug.
    async fn create(&self, entity: T) -> Result<T>;

    /// Replace an existing entity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EntityNotFound` if no entity has this id.
    async fn update(&self, entity: T) -> Result<T>;

    /// Delete an entity. Returns `false` if it did not exist.
    async fn delete(&self, id: &str) -> Result<bool>;
}
