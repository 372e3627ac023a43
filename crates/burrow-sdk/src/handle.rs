use std::sync::Arc;

use tracing::info;

use burrow_catalog::{Collection, Database, Registry};
use burrow_kv::FlatStore;
use burrow_store::EntityStore;

use crate::config::{Layout, StorageConfig};
use crate::error::{SdkError, SdkResult};

/// An open storage root.
///
/// Databases are directories under the root in both layouts, so database
/// lifecycle is available regardless of layout. Collections exist only in
/// the hierarchical layout, key-value access only in the flattened one.
#[derive(Debug)]
pub struct Burrow {
    config: StorageConfig,
    registry: Registry,
    flat: Option<FlatStore>,
}

impl Burrow {
    /// Validate `config`, create the root if needed, and scan it.
    pub fn open(config: StorageConfig) -> SdkResult<Self> {
        config.validate()?;

        let store = EntityStore::new().with_sync_writes(config.sync_writes);
        let registry = Registry::with_store(&config.root, config.addressing, store)?;
        let flat = match config.layout {
            Layout::Hierarchical => None,
            Layout::Flattened => Some(FlatStore::with_store(&config.root, store)),
        };

        info!(
            root = %config.root.display(),
            layout = %config.layout,
            addressing = %config.addressing,
            databases = registry.list_databases().len(),
            "storage opened"
        );
        Ok(Self {
            config,
            registry,
            flat,
        })
    }

    /// Open with [`StorageConfig::from_env`].
    pub fn open_from_env() -> SdkResult<Self> {
        Self::open(StorageConfig::from_env()?)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn create_database(&self, name: &str) -> SdkResult<Arc<Database>> {
        Ok(self.registry.create_database(name)?)
    }

    pub fn delete_database(&self, name: &str) -> SdkResult<()> {
        Ok(self.registry.delete_database(name)?)
    }

    pub fn list_databases(&self) -> Vec<String> {
        self.registry.list_databases()
    }

    /// The hierarchical registry.
    pub fn registry(&self) -> SdkResult<&Registry> {
        match self.config.layout {
            Layout::Hierarchical => Ok(&self.registry),
            layout => Err(SdkError::WrongLayout {
                operation: "collection access",
                layout,
            }),
        }
    }

    /// Shorthand for `registry().use_database(db).use_collection(collection)`.
    pub fn collection(&self, database: &str, collection: &str) -> SdkResult<Arc<Collection>> {
        Ok(self
            .registry()?
            .use_database(database)?
            .use_collection(collection)?)
    }

    /// Flattened document and key-value access.
    pub fn flat(&self) -> SdkResult<&FlatStore> {
        self.flat.as_ref().ok_or(SdkError::WrongLayout {
            operation: "key-value access",
            layout: self.config.layout,
        })
    }
}
