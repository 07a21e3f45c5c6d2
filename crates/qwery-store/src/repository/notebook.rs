use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{actor_or_system, slug_for, FindOptions, Repository};
use crate::entities::Notebook;
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::storage::Storage;

/// Notebooks at `[notebook, id]`.
#[derive(Debug, Clone)]
pub struct NotebookRepository {
    collection: Collection,
}

impl NotebookRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(storage, IdPrefix::Notebook.entity_name(), "Notebook"),
        }
    }

    /// Notebooks of one project; empty when the project has none.
    pub async fn find_by_project_id(&self, project_id: &str) -> Result<Vec<Notebook>> {
        let all: Vec<Notebook> = self.collection.all().await?;
        Ok(all
            .into_iter()
            .filter(|notebook| notebook.project_id == project_id)
            .collect())
    }
}

#[async_trait]
impl Repository<Notebook> for NotebookRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Notebook>> {
        Ok(options.apply(self.collection.all().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notebook>> {
        self.collection.find(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Notebook>> {
        let all: Vec<Notebook> = self.collection.all().await?;
        Ok(all.into_iter().find(|notebook| notebook.slug == slug))
    }

    async fn create(&self, mut entity: Notebook) -> Result<Notebook> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::Notebook)?;
        }
        entity.created_by = actor_or_system(&entity.created_by);
        entity.slug = slug_for(&entity.id);
        if entity.version == 0 {
            entity.version = 1;
        }

        let key = self.collection.key(&entity.id)?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, cells = entity.cells.len(), "created notebook");
        Ok(entity)
    }

    async fn update(&self, mut entity: Notebook) -> Result<Notebook> {
        entity.updated_at = Utc::now();
        entity.slug = slug_for(&entity.id);

        let key = self.collection.key(&entity.id)?;
        self.collection.replace(&key, &entity.id, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.collection.delete(&self.collection.key(id)?).await
    }
}
