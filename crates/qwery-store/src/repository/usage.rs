use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{ConversationRepository, FindOptions, Repository};
use crate::entities::{Conversation, Usage};
use crate::error::Result;
use crate::id::IdPrefix;
use crate::storage::Storage;

/// Usage records at `[usage, id]`, newest first.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    collection: Collection,
    conversations: ConversationRepository,
}

impl UsageRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            conversations: ConversationRepository::new(storage.clone()),
            collection: Collection::new(storage, IdPrefix::Usage.entity_name(), "Usage"),
        }
    }

    async fn all_newest_first(&self) -> Result<Vec<Usage>> {
        let mut all: Vec<Usage> = self.collection.all().await?;
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(all)
    }

    pub async fn find_by_conversation_id(&self, conversation_id: &str) -> Result<Vec<Usage>> {
        let all = self.all_newest_first().await?;
        Ok(all
            .into_iter()
            .filter(|usage| usage.conversation_id == conversation_id)
            .collect())
    }

    /// Usage of the conversation with `slug`; empty when no conversation
    /// has that slug.
    pub async fn find_by_conversation_slug(&self, slug: &str) -> Result<Vec<Usage>> {
        let conversation: Option<Conversation> = self.conversations.find_by_slug(slug).await?;
        match conversation {
            Some(conversation) => self.find_by_conversation_id(&conversation.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// First free numeric id at or after the current millisecond.
    async fn next_id(&self) -> Result<i64> {
        let mut candidate = Utc::now().timestamp_millis();
        while self
            .collection
            .find::<Usage>(&candidate.to_string())
            .await?
            .is_some()
        {
            candidate += 1;
        }
        Ok(candidate)
    }
}

#[async_trait]
impl Repository<Usage> for UsageRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Usage>> {
        Ok(options.apply(self.all_newest_first().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Usage>> {
        self.collection.find(id).await
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<Usage>> {
        Ok(None)
    }

    async fn create(&self, mut entity: Usage) -> Result<Usage> {
        if entity.id == 0 {
            entity.id = self.next_id().await?;
        }
        let key = self.collection.key(&entity.id.to_string())?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = entity.id, conversation = %entity.conversation_id, "recorded usage");
        Ok(entity)
    }

    async fn update(&self, entity: Usage) -> Result<Usage> {
        let id = entity.id.to_string();
        let key = self.collection.key(&id)?;
        self.collection.replace(&key, &id, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.collection.delete(&self.collection.key(id)?).await
    }
}
