use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{
    actor_or_system, cursor_for, FindOptions, PaginatedResult, PaginationOptions, Repository,
};
use crate::entities::Message;
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::storage::{Storage, StorageKey};

const MESSAGE_KEY_DEPTH: usize = 3;

/// Messages at `[message, conversationId, id]`, oldest first.
///
/// Messages have no slug. Lookups by id alone scan every conversation
/// because the id does not name its conversation.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    collection: Collection,
}

impl MessageRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(storage, IdPrefix::Message.entity_name(), "Message"),
        }
    }

    fn message_key(&self, conversation_id: &str, id: &str) -> Result<StorageKey> {
        self.collection.prefix()?.child(conversation_id)?.child(id)
    }

    /// Key of the message with `id` in any conversation.
    async fn locate(&self, id: &str) -> Result<Option<StorageKey>> {
        let keys = self.collection.storage().list(&self.collection.prefix()?).await?;
        Ok(keys
            .into_iter()
            .find(|key| key.len() == MESSAGE_KEY_DEPTH && key.last() == id))
    }

    async fn scan_sorted(&self, prefix: &StorageKey) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self.collection.scan(prefix, MESSAGE_KEY_DEPTH).await?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    /// Every message of one conversation, oldest first.
    pub async fn find_by_conversation_id(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let prefix = self.collection.prefix()?.child(conversation_id)?;
        self.scan_sorted(&prefix).await
    }

    /// One page of a conversation, walking backwards in time.
    ///
    /// Returns up to `limit` messages created strictly before the cursor,
    /// oldest first. `next_cursor` is the creation time of the earliest
    /// returned message; pass it back to fetch the preceding page.
    pub async fn find_by_conversation_id_paginated(
        &self,
        conversation_id: &str,
        options: &PaginationOptions,
    ) -> Result<PaginatedResult<Message>> {
        let cursor = options.cursor_time()?;
        let mut messages = self.find_by_conversation_id(conversation_id).await?;
        if let Some(cursor) = cursor {
            messages.retain(|message| message.created_at < cursor);
        }

        messages.reverse();
        let has_more = messages.len() > options.limit;
        messages.truncate(options.limit);
        messages.reverse();

        let next_cursor = messages.first().map(|message| cursor_for(&message.created_at));
        Ok(PaginatedResult {
            items: messages,
            next_cursor,
            has_more,
        })
    }
}

#[async_trait]
impl Repository<Message> for MessageRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Message>> {
        let messages = self.scan_sorted(&self.collection.prefix()?).await?;
        Ok(options.apply(messages))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Message>> {
        match self.locate(id).await? {
            Some(key) => self.collection.get(&key).await,
            None => Ok(None),
        }
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<Message>> {
        Ok(None)
    }

    async fn create(&self, mut entity: Message) -> Result<Message> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::Message)?;
        }
        entity.created_by = actor_or_system(&entity.created_by);
        entity.updated_by = actor_or_system(&entity.updated_by);

        let key = self.message_key(&entity.conversation_id, &entity.id)?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, conversation = %entity.conversation_id, "created message");
        Ok(entity)
    }

    async fn update(&self, mut entity: Message) -> Result<Message> {
        entity.updated_at = Utc::now();
        entity.updated_by = actor_or_system(&entity.updated_by);

        let key = self.message_key(&entity.conversation_id, &entity.id)?;
        self.collection.replace(&key, &entity.id, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match self.locate(id).await? {
            Some(key) => self.collection.delete(&key).await,
            None => Ok(false),
        }
    }
}
