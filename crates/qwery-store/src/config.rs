//! Store configuration and storage root resolution.
//!
//! The storage root is resolved once by the caller and injected into
//! [`crate::Storage`]; nothing in the store reads the environment after
//! construction, so tests can point independent stores at distinct roots.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::{Result, StoreError};

/// Environment variable naming an explicit storage directory.
pub const STORAGE_DIR_ENV: &str = "QWERY_STORAGE_DIR";

/// Environment variable carrying the secret vault key.
pub const ENCRYPTION_KEY_ENV: &str = "QWERY_ENCRYPTION_KEY";

const APP_DIR: &str = "qwery";
const STORAGE_SUBDIR: &str = "storage";

/// Configuration injected into the storage engine and repositories.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding one JSON file per document
    pub root: PathBuf,

    /// Key material for secret fields; `None` stores secrets unencrypted
    pub encryption_key: Option<SecretString>,
}

impl StoreConfig {
    /// Configuration rooted at an explicit directory, without a vault key.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            encryption_key: None,
        }
    }

    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(SecretString::from(key.into()));
        self
    }

    /// Resolve the root and vault key from the process environment.
    pub fn from_env() -> Result<Self> {
        let root = resolve_root(None)?;
        let encryption_key = non_empty_env(ENCRYPTION_KEY_ENV).map(SecretString::from);
        Ok(Self {
            root,
            encryption_key,
        })
    }
}

/// Resolve the storage root.
///
/// Precedence: explicit override, `XDG_DATA_HOME`, `QWERY_STORAGE_DIR`,
/// then the platform default (`~/.local/share/qwery/storage`, or
/// `%LOCALAPPDATA%\qwery\storage` on Windows).
pub fn resolve_root(override_dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir);
    }
    if let Some(value) = non_empty_env("XDG_DATA_HOME") {
        return Ok(PathBuf::from(value).join(APP_DIR).join(STORAGE_SUBDIR));
    }
    if let Some(value) = non_empty_env(STORAGE_DIR_ENV) {
        return Ok(PathBuf::from(value));
    }
    default_root()
}

#[cfg(windows)]
fn default_root() -> Result<PathBuf> {
    let base = match non_empty_env("LOCALAPPDATA") {
        Some(value) => PathBuf::from(value),
        None => home_dir()?.join("AppData").join("Local"),
    };
    Ok(base.join(APP_DIR).join(STORAGE_SUBDIR))
}

#[cfg(not(windows))]
fn default_root() -> Result<PathBuf> {
    Ok(home_dir()?
        .join(".local")
        .join("share")
        .join(APP_DIR)
        .join(STORAGE_SUBDIR))
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        StoreError::Config("home directory is not known; cannot resolve storage root".to_string())
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
