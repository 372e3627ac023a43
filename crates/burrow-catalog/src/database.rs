//! The collection manager for one database.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use burrow_store::EntityStore;
use burrow_types::{validate_name, AddressingMode, EntityKind, METADATA_FILE};

use crate::collection::{write_metadata, Collection};
use crate::error::{CatalogError, CatalogResult};
use crate::record::CollectionMetadata;
use crate::relative_path;

/// A named container of collections, backed by a directory under the
/// storage root.
#[derive(Debug)]
pub struct Database {
    name: String,
    path: PathBuf,
    mode: AddressingMode,
    store: EntityStore,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Database {
    pub(crate) fn new(name: String, path: PathBuf, mode: AddressingMode, store: EntityStore) -> Self {
        Self {
            name,
            path,
            mode,
            store,
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the cached collections, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Create a collection: directory first, then metadata, then cache.
    pub fn create_collection(&self, name: &str) -> CatalogResult<Arc<Collection>> {
        validate_name(EntityKind::Collection, name)?;

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(CatalogError::already_exists(EntityKind::Collection, name));
        }

        let collection = self.new_collection(name);
        fs::create_dir(collection.path())
            .map_err(|e| CatalogError::from_io(EntityKind::Collection, name, e))?;

        if let Err(e) = write_metadata(&self.store, collection.path(), &collection.metadata()) {
            if let Err(cleanup) = fs::remove_dir_all(collection.path()) {
                warn!(collection = name, error = %cleanup, "failed to remove half-created collection");
            }
            return Err(CatalogError::from_store(EntityKind::Collection, name, e));
        }

        let collection = Arc::new(collection);
        collections.insert(name.to_string(), Arc::clone(&collection));

        info!(database = %self.name, collection = name, "collection created");
        Ok(collection)
    }

    /// Look up a collection, loading it from disk on a cache miss.
    pub fn use_collection(&self, name: &str) -> CatalogResult<Arc<Collection>> {
        validate_name(EntityKind::Collection, name)?;

        if let Some(collection) = self.collections.read().get(name) {
            debug!(database = %self.name, collection = name, "collection cache hit");
            return Ok(Arc::clone(collection));
        }

        let mut collections = self.collections.write();
        // Another caller may have loaded it while we waited.
        if let Some(collection) = collections.get(name) {
            return Ok(Arc::clone(collection));
        }

        let collection = Arc::new(self.load_collection(name)?);
        collections.insert(name.to_string(), Arc::clone(&collection));

        debug!(database = %self.name, collection = name, "collection loaded from disk");
        Ok(collection)
    }

    /// Delete a collection: remove its directory tree, then evict it.
    pub fn delete_collection(&self, name: &str) -> CatalogResult<()> {
        validate_name(EntityKind::Collection, name)?;

        let mut collections = self.collections.write();
        let path = self.path.join(name);
        if !collections.contains_key(name) && !path.is_dir() {
            return Err(CatalogError::not_found(EntityKind::Collection, name));
        }

        let result = fs::remove_dir_all(&path)
            .map_err(|e| CatalogError::from_io(EntityKind::Collection, name, e));
        if result.is_ok() || matches!(result, Err(CatalogError::NotFound { .. })) {
            collections.remove(name);
        }
        result?;

        info!(database = %self.name, collection = name, "collection deleted");
        Ok(())
    }

    /// Materialize every collection directory into the cache.
    ///
    /// Best-effort: entries whose names are not valid collection names or
    /// whose metadata cannot be read are logged and skipped. Returns the
    /// number of newly cached collections.
    pub fn load_all(&self) -> CatalogResult<usize> {
        let mut collections = self.collections.write();
        let entries = fs::read_dir(&self.path)
            .map_err(|e| CatalogError::from_io(EntityKind::Database, &self.name, e))?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if collections.contains_key(&name) {
                continue;
            }
            if let Err(e) = validate_name(EntityKind::Collection, &name) {
                warn!(database = %self.name, error = %e, "skipping directory");
                continue;
            }
            match self.load_collection(&name) {
                Ok(collection) => {
                    collections.insert(name, Arc::new(collection));
                    loaded += 1;
                }
                Err(e) => warn!(database = %self.name, collection = %name, error = %e, "skipping collection"),
            }
        }

        debug!(database = %self.name, loaded, "database fully loaded");
        Ok(loaded)
    }

    /// Build a collection from an existing directory.
    ///
    /// The directory alone makes the collection; `metadata.json`, when
    /// present, must decode and agree on the name.
    fn load_collection(&self, name: &str) -> CatalogResult<Collection> {
        let collection = self.new_collection(name);
        if !collection.path().is_dir() {
            return Err(CatalogError::not_found(EntityKind::Collection, name));
        }

        let metadata_path = collection.path().join(METADATA_FILE);
        if self.store.exists(&metadata_path) {
            let metadata: CollectionMetadata = self
                .store
                .load(&metadata_path)
                .map_err(|e| CatalogError::from_store(EntityKind::Collection, name, e))?;
            if metadata.name != name {
                return Err(CatalogError::Corrupt {
                    entity: EntityKind::Collection,
                    name: name.to_string(),
                    reason: format!("metadata names collection '{}'", metadata.name),
                });
            }
        }

        Ok(collection)
    }

    fn new_collection(&self, name: &str) -> Collection {
        Collection::new(
            name.to_string(),
            self.path.join(name),
            relative_path(&self.name, name),
            self.mode,
            self.store,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_types::ErrorKind;
    use serde_json::json;

    fn database(root: &Path) -> Database {
        let path = root.join("shop");
        fs::create_dir_all(&path).unwrap();
        Database::new("shop".into(), path, AddressingMode::Named, EntityStore::new())
    }

    #[test]
    fn create_makes_directory_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());

        let col = db.create_collection("orders").unwrap();
        assert_eq!(col.path(), db.path().join("orders"));
        assert!(col.path().is_dir());

        let metadata: CollectionMetadata = EntityStore::new()
            .load(&col.path().join(METADATA_FILE))
            .unwrap();
        assert_eq!(metadata.name, "orders");
        assert_eq!(metadata.path, "shop/orders");
        assert!(metadata.documents.is_empty());
    }

    #[test]
    fn create_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        db.create_collection("orders").unwrap();
        let err = db.create_collection("orders").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        // Also when only the directory knows about it.
        let cold = database(dir.path());
        let err = cold.create_collection("orders").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn use_loads_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        db.create_collection("orders")
            .unwrap()
            .create(Some("o1"), json!({"qty": 2}).as_object().cloned().unwrap())
            .unwrap();

        let cold = database(dir.path());
        assert!(cold.list_collections().is_empty());
        let col = cold.use_collection("orders").unwrap();
        assert_eq!(col.use_document("o1").unwrap().find("qty").unwrap(), json!(2));
        assert!(Arc::ptr_eq(&col, &cold.use_collection("orders").unwrap()));
    }

    #[test]
    fn use_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = database(dir.path()).use_collection("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "collection 'nope' does not exist");
    }

    #[test]
    fn use_with_mismatched_metadata_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        db.create_collection("a").unwrap();
        fs::rename(db.path().join("a"), db.path().join("b")).unwrap();

        let err = database(dir.path()).use_collection("b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn directory_without_metadata_is_a_collection() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        fs::create_dir(db.path().join("handmade")).unwrap();
        assert!(db.use_collection("handmade").is_ok());
    }

    #[test]
    fn delete_removes_tree_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        let col = db.create_collection("tmp").unwrap();
        col.create(Some("d"), Default::default()).unwrap();

        db.delete_collection("tmp").unwrap();
        assert!(!db.path().join("tmp").exists());
        assert!(db.list_collections().is_empty());
        assert_eq!(db.use_collection("tmp").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(db.delete_collection("tmp").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn delete_uncached_collection() {
        let dir = tempfile::tempdir().unwrap();
        database(dir.path()).create_collection("old").unwrap();

        let cold = database(dir.path());
        cold.delete_collection("old").unwrap();
        assert!(!cold.path().join("old").exists());
    }

    #[test]
    fn load_all_skips_files_and_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(dir.path());
        db.create_collection("a").unwrap();
        db.create_collection("b").unwrap();
        fs::create_dir(db.path().join(".hidden")).unwrap();
        fs::write(db.path().join("stray.json"), b"{}").unwrap();

        let cold = database(dir.path());
        assert_eq!(cold.load_all().unwrap(), 2);
        assert_eq!(cold.list_collections(), vec!["a", "b"]);
    }

    #[test]
    fn invalid_collection_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = database(dir.path()).create_collection("../x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);
    }
}
