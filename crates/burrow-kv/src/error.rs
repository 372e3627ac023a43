//! Error types for flattened document operations.

use thiserror::Error;

use burrow_store::StoreError;
use burrow_types::{ErrorKind, TypeError};

/// Errors from the flattened document store and key-value mutator.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("database '{database}' does not exist")]
    DatabaseNotFound { database: String },

    #[error("document '{document}' does not exist in database '{database}'")]
    DocumentNotFound { database: String, document: String },

    #[error("document '{document}' already exists in database '{database}'")]
    DocumentExists { database: String, document: String },

    /// The document exists but the key does not.
    #[error("key '{key}' does not exist in document '{document}'")]
    KeyNotFound { document: String, key: String },

    /// No document in the database carries the requested `uuid`.
    #[error("no document with uuid '{uuid}' in database '{database}'")]
    UuidNotFound { database: String, uuid: String },

    /// The file decoded as JSON but is not an object.
    #[error("document '{document}' is not a JSON object")]
    NotAnObject { document: String },

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("failed to persist document '{document}': {source}")]
    Store {
        document: String,
        #[source]
        source: StoreError,
    },
}

impl KvError {
    /// Wrap a store failure on `document`, lifting existence failures.
    pub(crate) fn from_store(database: &str, document: &str, source: StoreError) -> Self {
        match source {
            StoreError::AlreadyExists { .. } => Self::DocumentExists {
                database: database.to_string(),
                document: document.to_string(),
            },
            StoreError::NotFound { .. } => Self::DocumentNotFound {
                database: database.to_string(),
                document: document.to_string(),
            },
            source => Self::Store {
                document: document.to_string(),
                source,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseNotFound { .. }
            | Self::DocumentNotFound { .. }
            | Self::UuidNotFound { .. } => ErrorKind::NotFound,
            Self::DocumentExists { .. } => ErrorKind::AlreadyExists,
            Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            Self::NotAnObject { .. } => ErrorKind::DecodeFailure,
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::Store { source, .. } => source.kind(),
        }
    }
}

pub type KvResult<T> = std::result::Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_file_becomes_document_not_found() {
        let err = KvError::from_store(
            "db",
            "cart",
            StoreError::NotFound {
                path: PathBuf::from("/r/db/cart.json"),
            },
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "document 'cart' does not exist in database 'db'");
    }

    #[test]
    fn key_and_document_absence_differ() {
        let key = KvError::KeyNotFound {
            document: "cart".into(),
            key: "total".into(),
        };
        let doc = KvError::DocumentNotFound {
            database: "db".into(),
            document: "cart".into(),
        };
        assert_eq!(key.kind(), ErrorKind::KeyNotFound);
        assert_ne!(key.kind(), doc.kind());
    }
}
