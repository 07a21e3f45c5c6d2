//! Path and key resolution for the store CLI.

use std::path::PathBuf;

use qwery_store::config::resolve_root;

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, CliConfig};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "QWERY_STORE_CONFIG";

/// Resolve the config file path, checking QWERY_STORE_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the config file; a missing file is an empty config.
pub fn load_config() -> anyhow::Result<CliConfig> {
    let config_path = resolve_config_path()?;
    if !config_path.exists() {
        return Ok(CliConfig::default());
    }
    read_config(&config_path)
}

/// Resolve the storage root.
///
/// `--root` wins, then `[storage] root` from the config file, then the
/// store's own environment and platform defaults.
pub fn resolve_storage_root(cli: &Cli, config: &CliConfig) -> anyhow::Result<PathBuf> {
    let explicit = cli.root.clone().or_else(|| config.storage_root());
    Ok(resolve_root(explicit)?)
}

/// Resolve the vault key from `--key` / QWERY_ENCRYPTION_KEY, then the config file.
pub fn resolve_encryption_key(cli: &Cli, config: &CliConfig) -> Option<String> {
    cli.key
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.encryption_key())
        .map(str::to_string)
}

/// Exit with error code for not found errors.
pub fn exit_not_found_with_hint(message: &str, hint: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!("{}", hint);
    std::process::exit(3);
}
