use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{actor_or_system, matches_query, slug_for, FindOptions, Repository};
use crate::entities::{Project, PROJECT_STATUS_ACTIVE};
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::storage::Storage;

/// Projects at `[project, id]`.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    collection: Collection,
}

impl ProjectRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(storage, IdPrefix::Project.entity_name(), "Project"),
        }
    }

    pub async fn find_all_by_organization_id(&self, organization_id: &str) -> Result<Vec<Project>> {
        let all: Vec<Project> = self.collection.all().await?;
        Ok(all
            .into_iter()
            .filter(|project| project.organization_id == organization_id)
            .collect())
    }

    /// Case-insensitive substring search over name, slug and description,
    /// optionally scoped to one organization.
    pub async fn search(
        &self,
        query: &str,
        organization_id: Option<&str>,
        options: FindOptions,
    ) -> Result<Vec<Project>> {
        let query = query.trim().to_lowercase();
        let all: Vec<Project> = self.collection.all().await?;
        let matched = all
            .into_iter()
            .filter(|project| organization_id.map_or(true, |org| project.organization_id == org))
            .filter(|project| {
                query.is_empty()
                    || matches_query(
                        &query,
                        &[
                            project.name.as_str(),
                            project.slug.as_str(),
                            project.description.as_str(),
                        ],
                    )
            })
            .collect();
        Ok(options.apply(matched))
    }
}

#[async_trait]
impl Repository<Project> for ProjectRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Project>> {
        Ok(options.apply(self.collection.all().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        self.collection.find(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        let all: Vec<Project> = self.collection.all().await?;
        Ok(all.into_iter().find(|project| project.slug == slug))
    }

    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a project with the given id is
    /// already stored.
    async fn create(&self, mut entity: Project) -> Result<Project> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::Project)?;
        }
        let key = self.collection.key(&entity.id)?;
        if self.collection.get::<Project>(&key).await?.is_some() {
            return Err(self.collection.already_exists(&entity.id));
        }

        entity.created_by = actor_or_system(&entity.created_by);
        entity.updated_by = actor_or_system(&entity.updated_by);
        if entity.status.is_empty() {
            entity.status = PROJECT_STATUS_ACTIVE.to_string();
        }
        entity.slug = slug_for(&entity.id);

        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, organization = %entity.organization_id, "created project");
        Ok(entity)
    }

    async fn update(&self, mut entity: Project) -> Result<Project> {
        entity.updated_at = Utc::now();
        entity.updated_by = actor_or_system(&entity.updated_by);
        if entity.status.is_empty() {
            entity.status = PROJECT_STATUS_ACTIVE.to_string();
        }
        entity.slug = slug_for(&entity.id);

        let key = self.collection.key(&entity.id)?;
        self.collection.replace(&key, &entity.id, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.collection.delete(&self.collection.key(id)?).await
    }
}
