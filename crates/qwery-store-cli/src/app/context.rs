//! Application context for the store CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config file so handlers
//! resolve the root and vault key the same way.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use tracing::debug;

use qwery_store::{LocalVault, ProviderSchemas, Storage, Store, StoreConfig};

use crate::cli::Cli;
use crate::config::CliConfig;

use super::resolver::{load_config, resolve_encryption_key, resolve_storage_root};
use super::secrets::prompt_encryption_key;

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<CliConfig>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Config file contents, loaded on first use.
    pub fn config(&self) -> anyhow::Result<&CliConfig> {
        self.config.get_or_try_init(load_config)
    }

    pub fn storage_root(&self) -> anyhow::Result<PathBuf> {
        let root = resolve_storage_root(self.cli, self.config()?)?;
        debug!(root = %root.display(), "resolved storage root");
        Ok(root)
    }

    /// Vault key when one is configured; never prompts.
    pub fn encryption_key(&self) -> anyhow::Result<Option<String>> {
        Ok(resolve_encryption_key(self.cli, self.config()?))
    }

    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let config = StoreConfig::new(self.storage_root()?);
        Ok(match self.encryption_key()? {
            Some(key) => config.with_encryption_key(key),
            None => config,
        })
    }

    /// Raw storage engine at the resolved root.
    pub fn storage(&self) -> anyhow::Result<Storage> {
        Ok(Storage::at(self.storage_root()?))
    }

    /// Open the store with no provider schemas registered.
    ///
    /// Datasource secrets are then returned as stored.
    pub fn open_store(&self) -> anyhow::Result<Store> {
        Ok(Store::open(&self.store_config()?, ProviderSchemas::new())?)
    }

    /// Vault for the configured key, prompting on a TTY when none is set.
    pub fn vault(&self) -> anyhow::Result<LocalVault> {
        let key = match self.encryption_key()? {
            Some(key) => key,
            None => {
                let interactive = std::io::stdin().is_terminal() && !self.cli.no_input;
                prompt_encryption_key(interactive)?
            }
        };
        Ok(LocalVault::from_key(&key)?)
    }
}
