//! Error types for store operations.
//!
//! Storage-level and repository-level "not found" are separate variants:
//! `NotFound` means a document file is absent, `EntityNotFound` means a
//! repository mutation addressed an id that does not exist. Every other
//! I/O failure keeps its original `io::Error` so callers can tell "absent"
//! apart from "broken".

use std::io;
use std::path::Path;

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Core error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist on disk
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A repository mutation addressed a missing entity
    #[error("{entity} with id {id} not found")]
    EntityNotFound { entity: &'static str, id: String },

    /// A repository create addressed an id that is already taken
    #[error("{entity} with id {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },

    /// Any I/O failure other than a missing document
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage key is empty or has a segment that cannot be a path component
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Invalid caller input (identifiers, vault key)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Random source or cipher failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Translate an I/O error on `path`, mapping only missing files to `NotFound`.
    pub(crate) fn from_io(err: io::Error, path: &Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.display().to_string())
        } else {
            StoreError::Io(err)
        }
    }

    /// True for both storage-level and repository-level not-found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::EntityNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let mapped = StoreError::from_io(err, Path::new("/tmp/x.json"));
        assert!(matches!(mapped, StoreError::NotFound(ref p) if p == "/tmp/x.json"));
        assert!(mapped.is_not_found());
    }

    #[test]
    fn test_other_io_errors_are_preserved() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = StoreError::from_io(err, Path::new("/tmp/x.json"));
        match mapped {
            StoreError::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_entity_not_found_message() {
        let err = StoreError::EntityNotFound {
            entity: "Project",
            id: "prj_1".to_string(),
        };
        assert_eq!(err.to_string(), "Project with id prj_1 not found");
        assert!(err.is_not_found());
    }
}
