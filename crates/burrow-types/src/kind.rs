use std::fmt;

use serde::{Deserialize, Serialize};

/// The three levels of the storage hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Database,
    Collection,
    Document,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Collection => write!(f, "collection"),
            Self::Document => write!(f, "document"),
        }
    }
}

/// Transport-neutral classification of a failure.
///
/// Every error type in the workspace exposes a `kind()` accessor returning
/// one of these, so a network layer can map failures to status codes without
/// matching on crate-specific variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A create collided with an existing entity or key.
    AlreadyExists,
    /// The database, collection, or document is absent.
    NotFound,
    /// The document exists but the requested key does not.
    KeyNotFound,
    /// On-disk content could not be decoded.
    DecodeFailure,
    /// A filesystem operation failed for a reason other than absence.
    IoFailure,
    /// A caller-supplied name cannot be used as a path component.
    InvalidName,
    /// The operation is not available in the active layout or addressing mode.
    Unsupported,
    /// Configuration could not be read, parsed, or validated.
    InvalidConfig,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::KeyNotFound => "key_not_found",
            Self::DecodeFailure => "decode_failure",
            Self::IoFailure => "io_failure",
            Self::InvalidName => "invalid_name",
            Self::Unsupported => "unsupported",
            Self::InvalidConfig => "invalid_config",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_display() {
        assert_eq!(EntityKind::Database.to_string(), "database");
        assert_eq!(EntityKind::Collection.to_string(), "collection");
        assert_eq!(EntityKind::Document.to_string(), "document");
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::KeyNotFound).unwrap();
        assert_eq!(json, "\"key_not_found\"");
        assert_eq!(ErrorKind::AlreadyExists.to_string(), "already_exists");
    }
}
