use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{actor_or_system, matches_query, slug_for, FindOptions, Repository};
use crate::entities::Organization;
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::storage::Storage;

/// Organizations at `[organization, id]`.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    collection: Collection,
}

impl OrganizationRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(
                storage,
                IdPrefix::Organization.entity_name(),
                "Organization",
            ),
        }
    }

    /// Case-insensitive substring search over name and slug.
    ///
    /// A blank query matches every organization.
    pub async fn search(&self, query: &str, options: FindOptions) -> Result<Vec<Organization>> {
        let query = query.trim().to_lowercase();
        let all: Vec<Organization> = self.collection.all().await?;
        let matched = all
            .into_iter()
            .filter(|org| {
                query.is_empty() || matches_query(&query, &[org.name.as_str(), org.slug.as_str()])
            })
            .collect();
        Ok(options.apply(matched))
    }
}

#[async_trait]
impl Repository<Organization> for OrganizationRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Organization>> {
        Ok(options.apply(self.collection.all().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>> {
        self.collection.find(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        let all: Vec<Organization> = self.collection.all().await?;
        Ok(all.into_iter().find(|org| org.slug == slug))
    }

    async fn create(&self, mut entity: Organization) -> Result<Organization> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::Organization)?;
        }
        entity.created_by = actor_or_system(&entity.created_by);
        entity.updated_by = actor_or_system(&entity.updated_by);
        entity.slug = slug_for(&entity.id);

        let key = self.collection.key(&entity.id)?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, "created organization");
        Ok(entity)
    }

    async fn update(&self, mut entity: Organization) -> Result<Organization> {
        entity.updated_at = Utc::now();
        entity.updated_by = actor_or_system(&entity.updated_by);
        entity.slug = slug_for(&entity.id);

        let key = self.collection.key(&entity.id)?;
        self.collection.replace(&key, &entity.id, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.collection.delete(&self.collection.key(id)?).await
    }
}
