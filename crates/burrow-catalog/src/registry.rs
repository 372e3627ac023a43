//! The database registry: the top of the hierarchy.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use burrow_store::EntityStore;
use burrow_types::{validate_name, AddressingMode, EntityKind};

use crate::database::Database;
use crate::error::{CatalogError, CatalogResult};

/// Owns the storage root and the databases found under it.
///
/// Construct one per storage root and share it; two registries over the same
/// root do not see each other's cached state.
#[derive(Debug)]
pub struct Registry {
    root: PathBuf,
    mode: AddressingMode,
    store: EntityStore,
    databases: RwLock<HashMap<String, Arc<Database>>>,
}

impl Registry {
    /// Open (creating if needed) the storage root and cache every database
    /// directory directly beneath it.
    pub fn open(root: impl Into<PathBuf>, mode: AddressingMode) -> CatalogResult<Self> {
        Self::with_store(root, mode, EntityStore::new())
    }

    /// Like [`Registry::open`] with an explicitly configured entity store.
    pub fn with_store(
        root: impl Into<PathBuf>,
        mode: AddressingMode,
        store: EntityStore,
    ) -> CatalogResult<Self> {
        let root = root.into();
        let root_label = root.display().to_string();
        fs::create_dir_all(&root)
            .map_err(|e| CatalogError::from_io(EntityKind::Database, &root_label, e))?;

        let registry = Self {
            root,
            mode,
            store,
            databases: RwLock::new(HashMap::new()),
        };
        registry.scan()?;
        Ok(registry)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn addressing(&self) -> AddressingMode {
        self.mode
    }

    /// Names of the cached databases, sorted.
    pub fn list_databases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create_database(&self, name: &str) -> CatalogResult<Arc<Database>> {
        validate_name(EntityKind::Database, name)?;

        let mut databases = self.databases.write();
        if databases.contains_key(name) {
            return Err(CatalogError::already_exists(EntityKind::Database, name));
        }

        let path = self.root.join(name);
        fs::create_dir(&path).map_err(|e| CatalogError::from_io(EntityKind::Database, name, e))?;

        let database = Arc::new(self.new_database(name));
        databases.insert(name.to_string(), Arc::clone(&database));

        info!(database = name, "database created");
        Ok(database)
    }

    /// Look up a database, materializing it from its directory on a miss.
    pub fn use_database(&self, name: &str) -> CatalogResult<Arc<Database>> {
        validate_name(EntityKind::Database, name)?;

        if let Some(database) = self.databases.read().get(name) {
            debug!(database = name, "database cache hit");
            return Ok(Arc::clone(database));
        }

        let mut databases = self.databases.write();
        if let Some(database) = databases.get(name) {
            return Ok(Arc::clone(database));
        }
        if !self.root.join(name).is_dir() {
            return Err(CatalogError::not_found(EntityKind::Database, name));
        }

        let database = Arc::new(self.new_database(name));
        databases.insert(name.to_string(), Arc::clone(&database));

        debug!(database = name, "database loaded from disk");
        Ok(database)
    }

    pub fn delete_database(&self, name: &str) -> CatalogResult<()> {
        validate_name(EntityKind::Database, name)?;

        let mut databases = self.databases.write();
        let path = self.root.join(name);
        if !databases.contains_key(name) && !path.is_dir() {
            return Err(CatalogError::not_found(EntityKind::Database, name));
        }

        let result =
            fs::remove_dir_all(&path).map_err(|e| CatalogError::from_io(EntityKind::Database, name, e));
        if result.is_ok() || matches!(result, Err(CatalogError::NotFound { .. })) {
            databases.remove(name);
        }
        result?;

        info!(database = name, "database deleted");
        Ok(())
    }

    /// Cache every valid database directory under the root.
    fn scan(&self) -> CatalogResult<()> {
        let root_label = self.root.display().to_string();
        let entries = fs::read_dir(&self.root)
            .map_err(|e| CatalogError::from_io(EntityKind::Database, &root_label, e))?;

        let mut databases = self.databases.write();
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %entry.path().display(), "skipping non UTF-8 directory");
                continue;
            };
            if let Err(e) = validate_name(EntityKind::Database, &name) {
                warn!(error = %e, "skipping directory");
                continue;
            }
            let database = Arc::new(self.new_database(&name));
            databases.insert(name, database);
        }

        debug!(root = %root_label, databases = databases.len(), "storage root scanned");
        Ok(())
    }

    fn new_database(&self, name: &str) -> Database {
        Database::new(name.to_string(), self.root.join(name), self.mode, self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_types::ErrorKind;
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");

        let registry = Registry::open(&root, AddressingMode::Generated).unwrap();
        assert!(root.is_dir());
        assert_eq!(registry.root(), root);
        assert!(registry.list_databases().is_empty());
    }

    #[test]
    fn open_scans_existing_databases() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
        assert_eq!(registry.list_databases(), vec!["alpha", "beta"]);
    }

    #[test]
    fn full_hierarchy_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
            let db = registry.create_database("inventory").unwrap();
            let col = db.create_collection("items").unwrap();
            let doc = col
                .create(None, json!({"sku": "A-1"}).as_object().cloned().unwrap())
                .unwrap();
            doc.id().to_string()
        };

        let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
        let doc = registry
            .use_database("inventory")
            .unwrap()
            .use_collection("items")
            .unwrap()
            .use_document(&id)
            .unwrap();
        assert_eq!(doc.find("sku").unwrap(), json!("A-1"));
        assert_eq!(doc.record().path, format!("inventory/items/{id}.json"));
    }

    #[test]
    fn create_existing_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
        registry.create_database("main").unwrap();

        let err = registry.create_database("main").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(err.to_string(), "database 'main' already exists");
    }

    #[test]
    fn use_picks_up_directory_created_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
        fs::create_dir(dir.path().join("late")).unwrap();

        let db = registry.use_database("late").unwrap();
        assert_eq!(db.name(), "late");
        assert!(Arc::ptr_eq(&db, &registry.use_database("late").unwrap()));
    }

    #[test]
    fn delete_then_use_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
        registry.create_database("gone").unwrap().create_collection("c").unwrap();

        registry.delete_database("gone").unwrap();
        assert!(!dir.path().join("gone").exists());
        assert_eq!(registry.use_database("gone").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(registry.delete_database("gone").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn concurrent_create_database_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(Registry::open(dir.path(), AddressingMode::Generated).unwrap());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.create_database("race").map(|_| ())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        for err in results.into_iter().filter_map(Result::err) {
            assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        }
    }

    #[test]
    fn invalid_database_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::open(dir.path(), AddressingMode::Generated).unwrap();
        for name in ["", "..", "a/b"] {
            let err = registry.create_database(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidName);
        }
    }
}
