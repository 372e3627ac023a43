use std::path::{Path, PathBuf};

use burrow_types::ErrorKind;

/// Errors from entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record is already present at the target path.
    #[error("record already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// No record exists at the target path.
    #[error("record not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but does not decode as the expected record.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The record could not be serialized.
    #[error("failed to encode record for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Any other filesystem failure (permissions, disk full, ...).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classify an `io::Error` raised while touching `path`.
    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// The path the failing operation targeted.
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyExists { path }
            | Self::NotFound { path }
            | Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Io { path, .. } => path,
        }
    }

    /// Classification for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } => ErrorKind::DecodeFailure,
            Self::Encode { .. } | Self::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_is_classified() {
        let err = StoreError::from_io(
            Path::new("/x/y.json"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.path(), Path::new("/x/y.json"));
    }

    #[test]
    fn other_io_is_io_failure() {
        let err = StoreError::from_io(
            Path::new("/x"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().starts_with("I/O error on /x"));
    }
}
