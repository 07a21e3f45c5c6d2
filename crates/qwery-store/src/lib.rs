//! # Qwery Store
//!
//! Embedded local document store for Qwery: application entities persisted
//! as one JSON file each under a storage root, guarded by in-process
//! per-key reader/writer locks, with field-level encryption for secret
//! datasource configuration.
//!
//! ## Architecture
//!
//! - **id**: sortable, prefixed identifiers
//! - **lock**: per-key async reader/writer locks with RAII guards
//! - **storage**: hierarchical key to JSON file engine
//! - **vault**: AES-256-GCM protection of single string values
//! - **schema**: provider configuration schemas and secret field detection
//! - **entities**: persisted entity types
//! - **repository**: typed CRUD adapters per entity
//! - **store**: wiring of the above from a [`StoreConfig`]
//!
//! ## Example
//!
//! ```no_run
//! use qwery_store::{Organization, ProviderSchemas, Repository, Store, StoreConfig};
//!
//! # async fn run() -> qwery_store::Result<()> {
//! let store = Store::open(&StoreConfig::from_env()?, ProviderSchemas::new())?;
//! let org = store
//!     .organizations()
//!     .create(Organization::new("Acme", "usr_1"))
//!     .await?;
//! assert!(org.id.starts_with("org_"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entities;
pub mod error;
pub mod fs;
pub mod id;
pub mod lock;
pub mod repository;
pub mod schema;
pub mod storage;
pub mod store;
pub mod vault;

pub use config::StoreConfig;
pub use entities::{
    Conversation, Datasource, DatasourceKind, Message, MessageRole, Notebook, Organization,
    Project, Usage, User, UserRole,
};
pub use error::{Result, StoreError};
pub use id::{IdGenerator, IdPrefix};
pub use lock::{LockGuard, LockManager, LockMode};
pub use repository::{FindOptions, PaginatedResult, PaginationOptions, Repository};
pub use schema::{ConfigSchema, ProviderSchemas};
pub use storage::{Storage, StorageKey};
pub use store::Store;
pub use vault::{LocalVault, SecretVault};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
