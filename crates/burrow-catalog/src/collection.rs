//! The document manager for one collection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use burrow_store::{record_stem, EntityStore, StoreResult};
use burrow_types::{
    validate_document_key, AddressingMode, DocumentId, EntityKind, TypeError, METADATA_FILE,
};

use crate::document::Document;
use crate::error::{CatalogError, CatalogResult};
use crate::record::{CollectionMetadata, DocumentRecord, Fields};
use crate::relative_path;

/// A named container of documents, backed by a directory.
///
/// Documents are cached by id. In name-addressed deployments a document is
/// looked up by its `name` field with a linear scan of the cache; the name
/// given at creation is also its id and file stem, and `rename` changes only
/// the name.
#[derive(Debug)]
pub struct Collection {
    name: String,
    /// Absolute directory path; always `join(database.path, name)`.
    path: PathBuf,
    /// Directory path relative to the storage root.
    rel_path: String,
    mode: AddressingMode,
    store: EntityStore,
    documents: RwLock<HashMap<String, Arc<Document>>>,
}

impl Collection {
    pub(crate) fn new(
        name: String,
        path: PathBuf,
        rel_path: String,
        mode: AddressingMode,
        store: EntityStore,
    ) -> Self {
        Self {
            name,
            path,
            rel_path,
            mode,
            store,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn addressing(&self) -> AddressingMode {
        self.mode
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Cached documents, sorted by id.
    pub fn list(&self) -> Vec<Arc<Document>> {
        let mut docs: Vec<Arc<Document>> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| a.id().cmp(b.id()));
        docs
    }

    /// Create a document.
    ///
    /// Name-addressed collections require `key`; id-addressed collections
    /// generate the id and reject a caller-supplied key.
    pub fn create(&self, key: Option<&str>, data: Fields) -> CatalogResult<Arc<Document>> {
        let (id, name) = match (self.mode, key) {
            (AddressingMode::Generated, None) => (DocumentId::new().to_string(), None),
            (AddressingMode::Generated, Some(_)) => {
                return Err(CatalogError::Unsupported {
                    operation: "caller-supplied document keys",
                    mode: self.mode,
                })
            }
            (AddressingMode::Named, Some(key)) => {
                validate_document_key(key)?;
                (key.to_string(), Some(key.to_string()))
            }
            (AddressingMode::Named, None) => {
                return Err(TypeError::InvalidName {
                    entity: EntityKind::Document,
                    name: String::new(),
                    reason: "name-addressed documents require a name".into(),
                }
                .into())
            }
        };

        let mut docs = self.documents.write();
        let name_taken = match name.as_deref() {
            Some(n) => {
                docs.values().any(|d| d.answers_to(n)) || self.load_from_disk(&docs, n)?.is_some()
            }
            None => false,
        };
        if docs.contains_key(&id) || name_taken {
            return Err(CatalogError::already_exists(
                EntityKind::Document,
                name.as_deref().unwrap_or(&id),
            ));
        }

        let doc = Arc::new(self.new_document(id.clone(), name, data));
        docs.insert(id.clone(), Arc::clone(&doc));
        if let Err(e) = doc.persist_new() {
            docs.remove(&id);
            return Err(e);
        }

        info!(collection = %self.name, document = %id, "document created");
        Ok(doc)
    }

    /// Look up a document, loading it from disk on a cache miss.
    pub fn use_document(&self, key: &str) -> CatalogResult<Arc<Document>> {
        validate_document_key(key)?;

        {
            let docs = self.documents.read();
            if let Some(doc) = self.cached(&docs, key) {
                debug!(collection = %self.name, document = key, "document cache hit");
                return Ok(doc);
            }
        }

        let mut docs = self.documents.write();
        // Another caller may have loaded it while we waited.
        if let Some(doc) = self.cached(&docs, key) {
            return Ok(doc);
        }

        let doc = self
            .load_from_disk(&docs, key)?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Document, key))?;
        let doc = Arc::new(doc);
        docs.insert(doc.id().to_string(), Arc::clone(&doc));

        debug!(collection = %self.name, document = key, "document loaded from disk");
        Ok(doc)
    }

    /// Delete a document: remove the file, then evict it.
    pub fn delete(&self, key: &str) -> CatalogResult<()> {
        validate_document_key(key)?;

        let mut docs = self.documents.write();
        let doc = match self.cached(&docs, key) {
            Some(doc) => doc,
            None => Arc::new(
                self.load_from_disk(&docs, key)?
                    .ok_or_else(|| CatalogError::not_found(EntityKind::Document, key))?,
            ),
        };

        let result = doc.remove();
        if result.is_ok() || matches!(result, Err(CatalogError::NotFound { .. })) {
            docs.remove(doc.id());
        }
        result?;

        info!(collection = %self.name, document = key, "document deleted");
        Ok(())
    }

    /// Change a document's name. Name-addressed collections only.
    ///
    /// The id and file path do not change. Fails with `AlreadyExists` if
    /// `new` is another document's name or id, in memory or on disk.
    pub fn rename(&self, old: &str, new: &str) -> CatalogResult<Arc<Document>> {
        if !self.mode.is_named() {
            return Err(CatalogError::Unsupported {
                operation: "rename",
                mode: self.mode,
            });
        }
        validate_document_key(old)?;
        validate_document_key(new)?;

        let mut docs = self.documents.write();
        let doc = match self.cached(&docs, old) {
            Some(doc) => doc,
            None => {
                let doc = Arc::new(
                    self.load_from_disk(&docs, old)?
                        .ok_or_else(|| CatalogError::not_found(EntityKind::Document, old))?,
                );
                docs.insert(doc.id().to_string(), Arc::clone(&doc));
                doc
            }
        };
        if old == new {
            return Ok(doc);
        }

        let taken_in_memory = docs
            .iter()
            .any(|(id, d)| !Arc::ptr_eq(d, &doc) && (id == new || d.answers_to(new)));
        let taken_on_disk = (doc.id() != new
            && self.store.exists(&EntityStore::record_path(&self.path, new)))
            || self.load_from_disk(&docs, new)?.is_some();
        if taken_in_memory || taken_on_disk {
            return Err(CatalogError::already_exists(EntityKind::Document, new));
        }

        doc.rename_to(new)?;
        info!(collection = %self.name, document = %doc.id(), from = old, to = new, "document renamed");
        Ok(doc)
    }

    /// Cached documents whose `key` field equals `value`, sorted by id.
    ///
    /// Documents not yet loaded are not considered; call
    /// [`load_all`](Self::load_all) first for a complete answer.
    pub fn find_by_field(&self, key: &str, value: &Value) -> Vec<Arc<Document>> {
        let docs = self.documents.read();
        let mut matches: Vec<Arc<Document>> = docs
            .values()
            .filter(|d| d.field_equals(key, value))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id().cmp(b.id()));
        matches
    }

    /// Load every readable document file into the cache.
    ///
    /// Best-effort: unreadable files and records that contradict their file
    /// name are logged and skipped. Returns the number of newly cached
    /// documents.
    pub fn load_all(&self) -> CatalogResult<usize> {
        let mut docs = self.documents.write();
        let records = self
            .store
            .scan::<DocumentRecord>(&self.path)
            .map_err(|e| CatalogError::from_store(EntityKind::Collection, &self.name, e))?;

        let mut loaded = 0;
        for (path, record) in records {
            if docs.contains_key(&record.id) {
                continue;
            }
            if record_stem(&path) != Some(record.id.as_str()) {
                warn!(path = %path.display(), id = %record.id, "record id does not match file name; skipping");
                continue;
            }
            if let Some(name) = record.name.as_deref() {
                if docs.values().any(|d| d.answers_to(name)) {
                    warn!(path = %path.display(), name, "duplicate document name on disk; skipping");
                    continue;
                }
            }
            let doc = Arc::new(self.document_from_record(record, path));
            docs.insert(doc.id().to_string(), doc);
            loaded += 1;
        }

        debug!(collection = %self.name, loaded, total = docs.len(), "collection fully loaded");
        Ok(loaded)
    }

    /// Descriptive metadata for the current cache contents.
    pub fn metadata(&self) -> CollectionMetadata {
        let mut ids: Vec<String> = self.documents.read().keys().cloned().collect();
        ids.sort();
        CollectionMetadata {
            name: self.name.clone(),
            path: self.rel_path.clone(),
            documents: ids,
        }
    }

    /// Rewrite `metadata.json` from the current cache contents.
    pub fn save_metadata(&self) -> CatalogResult<()> {
        // Held exclusively so concurrent saves do not interleave writes.
        let docs = self.documents.write();
        let mut ids: Vec<String> = docs.keys().cloned().collect();
        ids.sort();
        let metadata = CollectionMetadata {
            name: self.name.clone(),
            path: self.rel_path.clone(),
            documents: ids,
        };
        write_metadata(&self.store, &self.path, &metadata)
            .map_err(|e| CatalogError::from_store(EntityKind::Collection, &self.name, e))
    }

    fn cached(&self, docs: &HashMap<String, Arc<Document>>, key: &str) -> Option<Arc<Document>> {
        match self.mode {
            AddressingMode::Generated => docs.get(key).cloned(),
            AddressingMode::Named => docs.values().find(|d| d.answers_to(key)).cloned(),
        }
    }

    /// Locate an uncached document on disk.
    fn load_from_disk(
        &self,
        docs: &HashMap<String, Arc<Document>>,
        key: &str,
    ) -> CatalogResult<Option<Document>> {
        let direct = EntityStore::record_path(&self.path, key);

        match self.mode {
            AddressingMode::Generated => {
                if !self.store.exists(&direct) {
                    return Ok(None);
                }
                let record: DocumentRecord = self
                    .store
                    .load(&direct)
                    .map_err(|e| CatalogError::from_store(EntityKind::Document, key, e))?;
                if record.id != key {
                    return Err(CatalogError::Corrupt {
                        entity: EntityKind::Document,
                        name: key.to_string(),
                        reason: format!("record id '{}' does not match file name", record.id),
                    });
                }
                Ok(Some(self.document_from_record(record, direct)))
            }
            AddressingMode::Named => {
                // The name given at creation is the file stem, unless renamed since.
                if !docs.contains_key(key) && self.store.exists(&direct) {
                    let record: DocumentRecord = self
                        .store
                        .load(&direct)
                        .map_err(|e| CatalogError::from_store(EntityKind::Document, key, e))?;
                    if record.id == key && record.name.as_deref() == Some(key) {
                        return Ok(Some(self.document_from_record(record, direct)));
                    }
                }

                let records = self
                    .store
                    .scan::<DocumentRecord>(&self.path)
                    .map_err(|e| CatalogError::from_store(EntityKind::Collection, &self.name, e))?;
                for (path, record) in records {
                    if record.name.as_deref() != Some(key) || docs.contains_key(&record.id) {
                        continue;
                    }
                    if record_stem(&path) != Some(record.id.as_str()) {
                        warn!(path = %path.display(), id = %record.id, "record id does not match file name; skipping");
                        continue;
                    }
                    return Ok(Some(self.document_from_record(record, path)));
                }
                Ok(None)
            }
        }
    }

    fn new_document(&self, id: String, name: Option<String>, data: Fields) -> Document {
        let path = EntityStore::record_path(&self.path, &id);
        let rel_path = relative_path(&self.rel_path, &format!("{id}.json"));
        Document::new(id, name, data, path, rel_path, self.store)
    }

    fn document_from_record(&self, record: DocumentRecord, path: PathBuf) -> Document {
        let rel_path = relative_path(&self.rel_path, &format!("{}.json", record.id));
        Document::from_record(record, path, rel_path, self.store)
    }
}

/// Write `metadata.json` inside `dir`, creating or replacing it.
pub(crate) fn write_metadata(
    store: &EntityStore,
    dir: &Path,
    metadata: &CollectionMetadata,
) -> StoreResult<()> {
    let path = dir.join(METADATA_FILE);
    if store.exists(&path) {
        store.overwrite(&path, metadata)
    } else {
        store.create(&path, metadata)
    }
}
