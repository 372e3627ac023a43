use std::path::PathBuf;

use thiserror::Error;

use burrow_catalog::CatalogError;
use burrow_kv::KvError;
use burrow_types::{ErrorKind, TypeError};

use crate::config::Layout;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("config file {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The handle was opened with a different layout.
    #[error("{operation} is not available with the {layout} layout")]
    WrongLayout {
        operation: &'static str,
        layout: Layout,
    },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Kv(#[from] KvError),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Toml(_) => ErrorKind::InvalidConfig,
            Self::ConfigIo { .. } => ErrorKind::IoFailure,
            Self::WrongLayout { .. } => ErrorKind::Unsupported,
            Self::Type(e) => e.kind(),
            Self::Catalog(e) => e.kind(),
            Self::Kv(e) => e.kind(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
