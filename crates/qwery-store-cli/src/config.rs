use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub vault: VaultSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    pub root: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VaultSection {
    pub encryption_key: Option<String>,
}

impl CliConfig {
    pub fn storage_root(&self) -> Option<PathBuf> {
        self.storage
            .root
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn encryption_key(&self) -> Option<&str> {
        self.vault
            .encryption_key
            .as_deref()
            .filter(|value| !value.trim().is_empty())
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("store.toml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<CliConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("qwery"));
        }
    }
    Ok(home_dir()?.join(".config").join("qwery"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_config() {
        let config: CliConfig = toml::from_str(
            "[storage]\nroot = \"/tmp/qwery\"\n\n[vault]\nencryption_key = \"k\"\n",
        )
        .unwrap();
        assert_eq!(config.storage_root(), Some(PathBuf::from("/tmp/qwery")));
        assert_eq!(config.encryption_key(), Some("k"));
    }

    #[test]
    fn test_sections_are_optional() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert!(config.storage_root().is_none());
        assert!(config.encryption_key().is_none());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config: CliConfig =
            toml::from_str("[storage]\nroot = \" \"\n[vault]\nencryption_key = \"\"\n").unwrap();
        assert!(config.storage_root().is_none());
        assert!(config.encryption_key().is_none());
    }
}
