//! Typed repositories over the storage engine.
//!
//! One adapter per entity type. Lookups by slug or parent id are full scans
//! of the entity's key prefix filtered in memory; there is no secondary
//! index.

mod collection;
mod conversation;
mod datasource;
mod message;
mod notebook;
mod organization;
mod project;
mod traits;
mod usage;
mod user;

pub use conversation::ConversationRepository;
pub use datasource::DatasourceRepository;
pub use message::MessageRepository;
pub use notebook::NotebookRepository;
pub use organization::OrganizationRepository;
pub use project::ProjectRepository;
pub use traits::Repository;
pub use usage::UsageRepository;
pub use user::UserRepository;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Result, StoreError};
use crate::id::BASE62;

/// Actor recorded when the caller does not name one.
pub const SYSTEM_ACTOR: &str = "system";

const SLUG_LENGTH: usize = 10;

/// Offset and limit applied to `find_all` style results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Items to skip
    pub offset: usize,

    /// Maximum items returned; `None` or zero means unlimited
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Slice `items` to this window.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let remaining = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) if limit > 0 => remaining.take(limit).collect(),
            _ => remaining.collect(),
        }
    }
}

/// Cursor window for newest-first paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Only items created strictly before this RFC 3339 instant
    pub cursor: Option<String>,

    pub limit: usize,
}

impl PaginationOptions {
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            limit,
        }
    }

    pub fn after(cursor: impl Into<String>, limit: usize) -> Self {
        Self {
            cursor: Some(cursor.into()),
            limit,
        }
    }

    pub(crate) fn cursor_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.cursor
            .as_deref()
            .map(|cursor| {
                DateTime::parse_from_rfc3339(cursor)
                    .map(|at| at.with_timezone(&Utc))
                    .map_err(|e| StoreError::InvalidInput(format!("invalid cursor {}: {}", cursor, e)))
            })
            .transpose()
    }
}

/// One page of results, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,

    /// Cursor for the next (older) page; `None` when this page is empty
    pub next_cursor: Option<String>,

    /// True when older items exist beyond this page
    pub has_more: bool,
}

/// Encode a timestamp as a lossless pagination cursor.
pub fn cursor_for(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Short alias derived deterministically from an id.
///
/// Ten base62 characters taken from the BLAKE3 digest of the id.
pub fn slug_for(id: &str) -> String {
    let digest = blake3::hash(id.as_bytes());
    digest.as_bytes()[..SLUG_LENGTH]
        .iter()
        .map(|byte| BASE62[(*byte as usize) % BASE62.len()] as char)
        .collect()
}

/// `actor` if set, otherwise [`SYSTEM_ACTOR`].
pub(crate) fn actor_or_system(actor: &str) -> String {
    if actor.is_empty() {
        SYSTEM_ACTOR.to_string()
    } else {
        actor.to_string()
    }
}

/// Case-insensitive substring match against any of `fields`.
pub(crate) fn matches_query(query: &str, fields: &[&str]) -> bool {
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(query))
}
