//! Shared state for flattened storage: the root, the entity store, and the
//! lock table every flattened operation goes through.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use burrow_store::EntityStore;
use burrow_types::{validate_document_key, validate_name, EntityKind};

use crate::documents::FlatDocuments;
use crate::error::{KvError, KvResult};
use crate::locks::DocumentLocks;
use crate::mutator::KeyValueMutator;

/// A flattened document's content: its top-level key-value pairs.
pub type FlatFields = Map<String, Value>;

/// Flattened storage rooted at one directory: `{root}/{db}/{document}.json`.
///
/// Cheap to clone; clones share the lock table.
#[derive(Clone, Debug)]
pub struct FlatStore {
    root: PathBuf,
    store: EntityStore,
    locks: Arc<DocumentLocks>,
}

impl FlatStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_store(root, EntityStore::new())
    }

    pub fn with_store(root: impl Into<PathBuf>, store: EntityStore) -> Self {
        Self {
            root: root.into(),
            store,
            locks: Arc::new(DocumentLocks::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key-level access to documents.
    pub fn mutator(&self) -> KeyValueMutator {
        KeyValueMutator::new(self.clone())
    }

    /// Whole-document access.
    pub fn documents(&self) -> FlatDocuments {
        FlatDocuments::new(self.clone())
    }

    pub(crate) fn locks(&self) -> &DocumentLocks {
        &self.locks
    }

    pub(crate) fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Validate `database` and return its directory, which must exist.
    pub(crate) fn database_dir(&self, database: &str) -> KvResult<PathBuf> {
        validate_name(EntityKind::Database, database)?;
        let dir = self.root.join(database);
        if !dir.is_dir() {
            return Err(KvError::DatabaseNotFound {
                database: database.to_string(),
            });
        }
        Ok(dir)
    }

    /// Validate both names and return the document's file path.
    pub(crate) fn document_path(&self, database: &str, document: &str) -> KvResult<PathBuf> {
        validate_document_key(document)?;
        let dir = self.database_dir(database)?;
        Ok(EntityStore::record_path(&dir, document))
    }

    /// Read a document's content. The caller holds the document lock.
    pub(crate) fn read_fields(&self, database: &str, document: &str, path: &Path) -> KvResult<FlatFields> {
        let value: Value = self
            .store
            .load(path)
            .map_err(|e| KvError::from_store(database, document, e))?;
        match value {
            Value::Object(fields) => Ok(fields),
            _ => Err(KvError::NotAnObject {
                document: document.to_string(),
            }),
        }
    }

    /// Replace a document's content. The caller holds the document lock.
    pub(crate) fn write_fields(
        &self,
        database: &str,
        document: &str,
        path: &Path,
        fields: &FlatFields,
    ) -> KvResult<()> {
        self.store
            .overwrite(path, fields)
            .map_err(|e| KvError::from_store(database, document, e))
    }
}
