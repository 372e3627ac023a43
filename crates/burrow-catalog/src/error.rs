//! Error types for catalog operations.

use thiserror::Error;

use burrow_store::StoreError;
use burrow_types::{AddressingMode, EntityKind, ErrorKind, TypeError};

/// Errors that can occur while managing databases, collections, and documents.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An entity with this name already exists.
    #[error("{entity} '{name}' already exists")]
    AlreadyExists { entity: EntityKind, name: String },

    /// The entity is absent from both memory and disk.
    #[error("{entity} '{name}' does not exist")]
    NotFound { entity: EntityKind, name: String },

    /// `add` on a key that is already present.
    #[error("key '{key}' already exists in document '{document}'")]
    KeyExists { document: String, key: String },

    /// The document exists but the key does not.
    #[error("key '{key}' does not exist in document '{document}'")]
    KeyNotFound { document: String, key: String },

    /// On-disk content decoded but contradicts where it was found.
    #[error("corrupt {entity} '{name}': {reason}")]
    Corrupt {
        entity: EntityKind,
        name: String,
        reason: String,
    },

    /// The operation does not exist under the active addressing mode.
    #[error("{operation} is not supported with {mode} addressing")]
    Unsupported {
        operation: &'static str,
        mode: AddressingMode,
    },

    /// A caller-supplied name failed validation.
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// Record persistence failed.
    #[error("failed to persist {entity} '{name}': {source}")]
    Store {
        entity: EntityKind,
        name: String,
        #[source]
        source: StoreError,
    },

    /// Directory manipulation failed.
    #[error("filesystem error on {entity} '{name}': {source}")]
    Io {
        entity: EntityKind,
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Wrap a store failure, lifting existence failures to the entity level.
    pub(crate) fn from_store(entity: EntityKind, name: &str, source: StoreError) -> Self {
        match source {
            StoreError::AlreadyExists { .. } => Self::AlreadyExists {
                entity,
                name: name.to_string(),
            },
            StoreError::NotFound { .. } => Self::NotFound {
                entity,
                name: name.to_string(),
            },
            source => Self::Store {
                entity,
                name: name.to_string(),
                source,
            },
        }
    }

    /// Wrap a failed rewrite of a live record. The record was known to exist,
    /// so a vanished file is reported as an I/O failure rather than absence.
    pub(crate) fn rewrite_failed(entity: EntityKind, name: &str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound { path } => Self::Io {
                entity,
                name: name.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} disappeared before rewrite", path.display()),
                ),
            },
            source => Self::Store {
                entity,
                name: name.to_string(),
                source,
            },
        }
    }

    /// Wrap a directory operation failure.
    pub(crate) fn from_io(entity: EntityKind, name: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                entity,
                name: name.to_string(),
            },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists {
                entity,
                name: name.to_string(),
            },
            _ => Self::Io {
                entity,
                name: name.to_string(),
                source,
            },
        }
    }

    pub(crate) fn not_found(entity: EntityKind, name: &str) -> Self {
        Self::NotFound {
            entity,
            name: name.to_string(),
        }
    }

    pub(crate) fn already_exists(entity: EntityKind, name: &str) -> Self {
        Self::AlreadyExists {
            entity,
            name: name.to_string(),
        }
    }

    /// Classification for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } | Self::KeyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::Corrupt { .. } => ErrorKind::DecodeFailure,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::Store { source, .. } => source.kind(),
            Self::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Convenience type alias for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn store_existence_errors_are_lifted() {
        let err = CatalogError::from_store(
            EntityKind::Document,
            "report",
            StoreError::AlreadyExists {
                path: PathBuf::from("/r/report.json"),
            },
        );
        assert!(matches!(err, CatalogError::AlreadyExists { .. }));
        assert_eq!(err.to_string(), "document 'report' already exists");
    }

    #[test]
    fn store_io_errors_keep_their_kind() {
        let err = CatalogError::from_store(
            EntityKind::Document,
            "report",
            StoreError::Io {
                path: PathBuf::from("/r/report.json"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("'report'"));
    }

    #[test]
    fn vanished_record_on_rewrite_is_an_io_failure() {
        let err = CatalogError::rewrite_failed(
            EntityKind::Document,
            "report",
            StoreError::NotFound {
                path: PathBuf::from("/r/report.json"),
            },
        );
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn key_errors_are_distinct_from_entity_errors() {
        let missing_key = CatalogError::KeyNotFound {
            document: "d".into(),
            key: "k".into(),
        };
        let missing_doc = CatalogError::not_found(EntityKind::Document, "d");
        assert_ne!(missing_key.kind(), missing_doc.kind());
    }
}
