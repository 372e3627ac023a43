//! Documents and their field-level mutations.
//!
//! A [`Document`] is handed out as `Arc<Document>` by its
//! [`Collection`](crate::Collection). Every mutation takes the document's own
//! mutex, applies the change in memory, and rewrites the whole record. If the
//! rewrite fails the in-memory change is undone, so memory never claims
//! content that is not on disk.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use burrow_store::EntityStore;
use burrow_types::EntityKind;

use crate::error::{CatalogError, CatalogResult};
use crate::record::{DocumentRecord, Fields};

/// Mutable part of a document, guarded by the document's lock.
#[derive(Debug)]
struct DocumentState {
    name: Option<String>,
    data: Fields,
    /// Set once the backing file has been removed.
    deleted: bool,
}

/// A cached document belonging to one collection.
#[derive(Debug)]
pub struct Document {
    id: String,
    /// Absolute path of the record file.
    path: PathBuf,
    /// Path relative to the storage root, as stored in the record.
    rel_path: String,
    store: EntityStore,
    state: Mutex<DocumentState>,
}

impl Document {
    pub(crate) fn new(
        id: String,
        name: Option<String>,
        data: Fields,
        path: PathBuf,
        rel_path: String,
        store: EntityStore,
    ) -> Self {
        Self {
            id,
            path,
            rel_path,
            store,
            state: Mutex::new(DocumentState {
                name,
                data,
                deleted: false,
            }),
        }
    }

    /// Rebuild a document from a record found at `path`.
    pub(crate) fn from_record(
        record: DocumentRecord,
        path: PathBuf,
        rel_path: String,
        store: EntityStore,
    ) -> Self {
        Self::new(record.id, record.name, record.data, path, rel_path, store)
    }

    /// The document identifier (also its file stem).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The descriptive name, if the deployment is name-addressed.
    pub fn name(&self) -> Option<String> {
        self.state.lock().name.clone()
    }

    /// Absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A copy of the payload.
    pub fn data(&self) -> Fields {
        self.state.lock().data.clone()
    }

    /// Name and payload read under a single lock acquisition.
    pub fn snapshot(&self) -> (Option<String>, Fields) {
        let state = self.state.lock();
        (state.name.clone(), state.data.clone())
    }

    /// The full record as it would be written to disk.
    pub fn record(&self) -> DocumentRecord {
        let state = self.state.lock();
        self.record_of(&state)
    }

    /// Insert a new key. Fails if the key is already present.
    pub fn add(&self, key: &str, value: Value) -> CatalogResult<()> {
        let mut state = self.live_state()?;
        if state.data.contains_key(key) {
            return Err(CatalogError::KeyExists {
                document: self.label(&state),
                key: key.to_string(),
            });
        }
        state.data.insert(key.to_string(), value);
        if let Err(e) = self.persist(&state) {
            state.data.remove(key);
            return Err(e);
        }
        debug!(document = %self.id, key, "field added");
        Ok(())
    }

    /// Read the value of `key`.
    pub fn find(&self, key: &str) -> CatalogResult<Value> {
        let state = self.live_state()?;
        state
            .data
            .get(key)
            .cloned()
            .ok_or_else(|| CatalogError::KeyNotFound {
                document: self.label(&state),
                key: key.to_string(),
            })
    }

    /// Replace the value of an existing key, returning the previous value.
    pub fn update(&self, key: &str, value: Value) -> CatalogResult<Value> {
        let mut state = self.live_state()?;
        if !state.data.contains_key(key) {
            return Err(CatalogError::KeyNotFound {
                document: self.label(&state),
                key: key.to_string(),
            });
        }
        let previous = state.data.insert(key.to_string(), value).unwrap_or(Value::Null);
        if let Err(e) = self.persist(&state) {
            state.data.insert(key.to_string(), previous);
            return Err(e);
        }
        debug!(document = %self.id, key, "field updated");
        Ok(previous)
    }

    /// Remove an existing key, returning its value.
    pub fn delete_key(&self, key: &str) -> CatalogResult<Value> {
        let mut state = self.live_state()?;
        let Some(previous) = state.data.remove(key) else {
            return Err(CatalogError::KeyNotFound {
                document: self.label(&state),
                key: key.to_string(),
            });
        };
        if let Err(e) = self.persist(&state) {
            state.data.insert(key.to_string(), previous);
            return Err(e);
        }
        debug!(document = %self.id, key, "field deleted");
        Ok(previous)
    }

    /// Upsert every pair in `updates` with a single rewrite.
    pub fn merge(&self, updates: Fields) -> CatalogResult<()> {
        let mut state = self.live_state()?;
        let before = state.data.clone();
        state.data.extend(updates);
        if let Err(e) = self.persist(&state) {
            state.data = before;
            return Err(e);
        }
        debug!(document = %self.id, "fields merged");
        Ok(())
    }

    /// Whether this document is addressed by `name`.
    pub(crate) fn answers_to(&self, name: &str) -> bool {
        self.state.lock().name.as_deref() == Some(name)
    }

    /// Whether `key` holds exactly `value`.
    pub(crate) fn field_equals(&self, key: &str, value: &Value) -> bool {
        self.state.lock().data.get(key) == Some(value)
    }

    /// Write the record for the first time.
    pub(crate) fn persist_new(&self) -> CatalogResult<()> {
        let state = self.state.lock();
        self.store
            .create(&self.path, &self.record_of(&state))
            .map_err(|e| CatalogError::from_store(EntityKind::Document, &self.label(&state), e))
    }

    /// Change the descriptive name and rewrite the record in place.
    ///
    /// The path and id are untouched. If the write fails the new name stays
    /// in memory; a later successful write will carry it to disk. Every
    /// write failure here is reported as an I/O failure.
    pub(crate) fn rename_to(&self, new_name: &str) -> CatalogResult<()> {
        let mut state = self.live_state()?;
        state.name = Some(new_name.to_string());
        self.store
            .overwrite(&self.path, &self.record_of(&state))
            .map_err(|e| CatalogError::rewrite_failed(EntityKind::Document, &self.label(&state), e))
    }

    /// Remove the backing file and mark the document dead.
    pub(crate) fn remove(&self) -> CatalogResult<()> {
        let mut state = self.state.lock();
        let result = self
            .store
            .remove(&self.path)
            .map_err(|e| CatalogError::from_store(EntityKind::Document, &self.label(&state), e));
        // A missing file means the document is gone either way.
        if result.is_ok() || matches!(result, Err(CatalogError::NotFound { .. })) {
            state.deleted = true;
        }
        result
    }

    /// Keep this document's state locked until the guard drops.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> impl Sized + '_ {
        self.state.lock()
    }

    fn live_state(&self) -> CatalogResult<parking_lot::MutexGuard<'_, DocumentState>> {
        let state = self.state.lock();
        if state.deleted {
            return Err(CatalogError::not_found(
                EntityKind::Document,
                &self.label(&state),
            ));
        }
        Ok(state)
    }

    fn persist(&self, state: &DocumentState) -> CatalogResult<()> {
        self.store
            .overwrite(&self.path, &self.record_of(state))
            .map_err(|e| CatalogError::from_store(EntityKind::Document, &self.label(state), e))
    }

    fn record_of(&self, state: &DocumentState) -> DocumentRecord {
        DocumentRecord {
            id: self.id.clone(),
            name: state.name.clone(),
            path: self.rel_path.clone(),
            data: state.data.clone(),
        }
    }

    fn label(&self, state: &DocumentState) -> String {
        state.name.clone().unwrap_or_else(|| self.id.clone())
    }
}
