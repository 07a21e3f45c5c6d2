use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::collection::Collection;
use super::{FindOptions, Repository};
use crate::entities::User;
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::storage::Storage;

/// Users at `[user, id]`. The username doubles as the slug.
#[derive(Debug, Clone)]
pub struct UserRepository {
    collection: Collection,
}

impl UserRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(storage, IdPrefix::User.entity_name(), "User"),
        }
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<User>> {
        Ok(options.apply(self.collection.all().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.collection.find(id).await
    }

    async fn find_by_slug(&self, username: &str) -> Result<Option<User>> {
        let all: Vec<User> = self.collection.all().await?;
        Ok(all.into_iter().find(|user| user.username == username))
    }

    async fn create(&self, mut entity: User) -> Result<User> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::User)?;
        }
        let key = self.collection.key(&entity.id)?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, "created user");
        Ok(entity)
    }

    async fn update(&self, mut entity: User) -> Result<User> {
        entity.updated_at = Utc::now();
        let key = self.collection.key(&entity.id)?;
        self.collection.replace(&key, &entity.id, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.collection.delete(&self.collection.key(id)?).await
    }
}
