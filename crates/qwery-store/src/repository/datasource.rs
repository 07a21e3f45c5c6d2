use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use super::collection::Collection;
use super::{actor_or_system, slug_for, FindOptions, Repository};
use crate::entities::Datasource;
use crate::error::Result;
use crate::id::{self, IdPrefix};
use crate::schema::ProviderSchemas;
use crate::storage::Storage;
use crate::vault::SecretVault;

/// Datasources at `[datasource, id]`.
///
/// With a vault attached, every configuration field the provider schema
/// marks as secret is written protected and read back in plaintext. Without
/// a vault configuration is stored as given.
#[derive(Clone)]
pub struct DatasourceRepository {
    collection: Collection,
    vault: Option<Arc<dyn SecretVault>>,
    schemas: Arc<ProviderSchemas>,
}

impl DatasourceRepository {
    pub fn new(storage: Storage) -> Self {
        Self {
            collection: Collection::new(
                storage,
                IdPrefix::Datasource.entity_name(),
                "Datasource",
            ),
            vault: None,
            schemas: Arc::new(ProviderSchemas::default()),
        }
    }

    pub fn with_vault(mut self, vault: Arc<dyn SecretVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_schemas(mut self, schemas: Arc<ProviderSchemas>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Datasources of one project; empty when the project has none.
    pub async fn find_by_project_id(&self, project_id: &str) -> Result<Vec<Datasource>> {
        let all = self.load_all().await?;
        Ok(all
            .into_iter()
            .filter(|datasource| datasource.project_id == project_id)
            .collect())
    }

    /// Plaintext copy of `config` for `provider`.
    ///
    /// Values that cannot be decrypted stay protected; check them with
    /// [`SecretVault::is_protected`].
    pub fn reveal_secrets(
        &self,
        provider: &str,
        config: &Map<String, Value>,
    ) -> Map<String, Value> {
        let mut revealed = config.clone();
        let Some(vault) = &self.vault else {
            return revealed;
        };
        for field in self.schemas.secret_fields_for(provider) {
            if let Some(Value::String(value)) = revealed.get_mut(&field) {
                *value = vault.reveal(value);
            }
        }
        revealed
    }

    /// Protect the secret fields of `config` in place.
    ///
    /// A plaintext value equal to what `stored` already protects keeps the
    /// stored ciphertext, so unrelated updates leave secrets byte-identical.
    fn protect_secrets(
        &self,
        provider: &str,
        config: &mut Map<String, Value>,
        stored: Option<&Map<String, Value>>,
    ) -> Result<()> {
        let Some(vault) = &self.vault else {
            return Ok(());
        };
        for field in self.schemas.secret_fields_for(provider) {
            let Some(Value::String(value)) = config.get_mut(&field) else {
                continue;
            };
            if value.is_empty() || vault.is_protected(value) {
                continue;
            }
            let previous = stored
                .and_then(|stored| stored.get(&field))
                .and_then(Value::as_str)
                .filter(|previous| vault.is_protected(previous));
            *value = match previous {
                Some(previous) if vault.reveal(previous) == *value => previous.to_string(),
                _ => vault.protect(value)?,
            };
        }
        Ok(())
    }

    fn revealed(&self, mut datasource: Datasource) -> Datasource {
        datasource.config = self.reveal_secrets(&datasource.provider, &datasource.config);
        datasource
    }

    async fn load_all(&self) -> Result<Vec<Datasource>> {
        let all: Vec<Datasource> = self.collection.all().await?;
        Ok(all.into_iter().map(|datasource| self.revealed(datasource)).collect())
    }
}

#[async_trait]
impl Repository<Datasource> for DatasourceRepository {
    async fn find_all(&self, options: FindOptions) -> Result<Vec<Datasource>> {
        Ok(options.apply(self.load_all().await?))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Datasource>> {
        let found: Option<Datasource> = self.collection.find(id).await?;
        Ok(found.map(|datasource| self.revealed(datasource)))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Datasource>> {
        let all = self.load_all().await?;
        Ok(all.into_iter().find(|datasource| datasource.slug == slug))
    }

    async fn create(&self, mut entity: Datasource) -> Result<Datasource> {
        if entity.id.is_empty() {
            entity.id = id::create(IdPrefix::Datasource)?;
        }
        entity.created_by = actor_or_system(&entity.created_by);
        entity.updated_by = actor_or_system(&entity.updated_by);
        entity.slug = slug_for(&entity.id);
        self.protect_secrets(&entity.provider, &mut entity.config, None)?;

        let key = self.collection.key(&entity.id)?;
        self.collection.insert(&key, &entity).await?;
        debug!(id = %entity.id, provider = %entity.provider, "created datasource");
        Ok(self.revealed(entity))
    }

    async fn update(&self, mut entity: Datasource) -> Result<Datasource> {
        entity.updated_at = Utc::now();
        entity.updated_by = actor_or_system(&entity.updated_by);
        entity.slug = slug_for(&entity.id);

        let id = entity.id.clone();
        let key = self.collection.key(&id)?;
        let stored = self
            .collection
            .replace_with(&key, &id, move |document| {
                let previous = document.get("config").and_then(Value::as_object);
                self.protect_secrets(&entity.provider, &mut entity.config, previous)?;
                *document = serde_json::to_value(&entity)?;
                Ok(())
            })
            .await?;

        let stored: Datasource = serde_json::from_value(stored)?;
        Ok(self.revealed(stored))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.collection.delete(&self.collection.key(id)?).await
    }
}

impl std::fmt::Debug for DatasourceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasourceRepository")
            .field("collection", &self.collection)
            .field("vault", &self.vault.is_some())
            .finish()
    }
}
