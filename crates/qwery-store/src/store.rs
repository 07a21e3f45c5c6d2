//! Entry point wiring storage, vault and repositories together.

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::repository::{
    ConversationRepository, DatasourceRepository, MessageRepository, NotebookRepository,
    OrganizationRepository, ProjectRepository, UsageRepository, UserRepository,
};
use crate::schema::ProviderSchemas;
use crate::storage::Storage;
use crate::vault::{LocalVault, SecretVault};

/// One opened store: a storage root plus the optional secret vault.
///
/// Repositories handed out by a `Store` share its lock table, so they can
/// be used concurrently from any number of tasks.
#[derive(Clone)]
pub struct Store {
    storage: Storage,
    vault: Option<Arc<dyn SecretVault>>,
    schemas: Arc<ProviderSchemas>,
}

impl Store {
    /// Open the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if an encryption key is configured
    /// but blank, and `StoreError::Crypto` if key derivation fails.
    pub fn open(config: &StoreConfig, schemas: ProviderSchemas) -> Result<Self> {
        let vault = match &config.encryption_key {
            Some(key) => Some(Arc::new(LocalVault::new(key)?) as Arc<dyn SecretVault>),
            None => None,
        };
        info!(
            root = %config.root.display(),
            encrypted = vault.is_some(),
            "opened store"
        );
        Ok(Self {
            storage: Storage::new(config),
            vault,
            schemas: Arc::new(schemas),
        })
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn vault(&self) -> Option<&Arc<dyn SecretVault>> {
        self.vault.as_ref()
    }

    pub fn organizations(&self) -> OrganizationRepository {
        OrganizationRepository::new(self.storage.clone())
    }

    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.storage.clone())
    }

    pub fn datasources(&self) -> DatasourceRepository {
        let repository =
            DatasourceRepository::new(self.storage.clone()).with_schemas(self.schemas.clone());
        match &self.vault {
            Some(vault) => repository.with_vault(vault.clone()),
            None => repository,
        }
    }

    pub fn conversations(&self) -> ConversationRepository {
        ConversationRepository::new(self.storage.clone())
    }

    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.storage.clone())
    }

    pub fn notebooks(&self) -> NotebookRepository {
        NotebookRepository::new(self.storage.clone())
    }

    pub fn usage(&self) -> UsageRepository {
        UsageRepository::new(self.storage.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.storage.clone())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("storage", &self.storage)
            .field("encrypted", &self.vault.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_without_key_has_no_vault() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&StoreConfig::new(dir.path()), ProviderSchemas::new()).unwrap();
        assert!(store.vault().is_none());
        assert_eq!(store.storage().root(), dir.path());
    }

    #[test]
    fn test_open_rejects_blank_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path()).with_encryption_key("  ");
        assert!(Store::open(&config, ProviderSchemas::new()).is_err());
    }
}
