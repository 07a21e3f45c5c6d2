use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{actor_or_system, slug_for, FindOptions, Repository};
use crate::entities::Conversation;
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::storage::Storage;

/// Conversations at `[conversation, id]`, listed most recently updated first.
#[derive(Debug, Clone)]
pub struct ConversationRepository {
    collection: Collection,
}

impl ConversationRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(
                storage,
                IdPrefix::Conversation.entity_name(),
                "Conversation",
            ),
        }
    }

    async fn all_by_recency(&self) -> Result<Vec<Conversation>> {
        let mut all: Vec<Conversation> = self.collection.all().await?;
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    pub async fn find_by_project_id(&self, project_id: &str) -> Result<Vec<Conversation>> {
        let all = self.all_by_recency().await?;
        Ok(all
            .into_iter()
            .filter(|conversation| conversation.project_id == project_id)
            .collect())
    }

    pub async fn find_by_task_id(&self, task_id: &str) -> Result<Vec<Conversation>> {
        let all = self.all_by_recency().await?;
        Ok(all
            .into_iter()
            .filter(|conversation| conversation.task_id == task_id)
            .collect())
    }
}

#[async_trait]
impl Repository<Conversation> for ConversationRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Conversation>> {
        Ok(options.apply(self.all_by_recency().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>> {
        self.collection.find(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Conversation>> {
        let all: Vec<Conversation> = self.collection.all().await?;
        Ok(all.into_iter().find(|conversation| conversation.slug == slug))
    }

    async fn create(&self, mut entity: Conversation) -> Result<Conversation> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::Conversation)?;
        }
        entity.created_by = actor_or_system(&entity.created_by);
        entity.updated_by = actor_or_system(&entity.updated_by);
        entity.slug = slug_for(&entity.id);

        let key = self.collection.key(&entity.id)?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, project = %entity.project_id, "created conversation");
        Ok(entity)
    }

    async fn update(&self, mut entity: Conversation) -> Result<Conversation> {
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
