//! Whole-document operations on flattened storage.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use burrow_store::{EntityStore, StoreError};
use burrow_types::{validate_document_key, DocumentId};

use crate::error::{KvError, KvResult};
use crate::flat::{FlatFields, FlatStore};

/// Field injected into every flattened document at creation.
pub const UUID_FIELD: &str = "uuid";

/// Create, read, merge, delete, and search flattened documents.
#[derive(Clone, Debug)]
pub struct FlatDocuments {
    flat: FlatStore,
}

impl FlatDocuments {
    pub(crate) fn new(flat: FlatStore) -> Self {
        Self { flat }
    }

    /// Create `{database}/{name}.json` from `content` plus a generated
    /// [`UUID_FIELD`], returning the generated id.
    ///
    /// A caller-supplied `uuid` field is replaced.
    pub fn create_document(
        &self,
        database: &str,
        name: &str,
        mut content: FlatFields,
    ) -> KvResult<DocumentId> {
        let path = self.flat.document_path(database, name)?;
        let _guard = self.flat.locks().acquire(database, name);

        let id = DocumentId::new();
        content.insert(UUID_FIELD.to_string(), Value::String(id.to_string()));
        self.flat
            .store()
            .create(&path, &content)
            .map_err(|e| KvError::from_store(database, name, e))?;

        info!(database, document = name, uuid = %id, "document created");
        Ok(id)
    }

    pub fn read_document(&self, database: &str, name: &str) -> KvResult<FlatFields> {
        let path = self.flat.document_path(database, name)?;
        let _guard = self.flat.locks().acquire(database, name);
        self.flat.read_fields(database, name, &path)
    }

    /// Upsert every pair in `updates` with a single rewrite.
    pub fn update_document(&self, database: &str, name: &str, updates: FlatFields) -> KvResult<()> {
        let path = self.flat.document_path(database, name)?;
        let _guard = self.flat.locks().acquire(database, name);

        let mut fields = self.flat.read_fields(database, name, &path)?;
        fields.extend(updates);
        self.flat.write_fields(database, name, &path, &fields)
    }

    pub fn delete_document(&self, database: &str, name: &str) -> KvResult<()> {
        let path = self.flat.document_path(database, name)?;
        let _guard = self.flat.locks().acquire(database, name);

        self.flat
            .store()
            .remove(&path)
            .map_err(|e| KvError::from_store(database, name, e))?;

        info!(database, document = name, "document deleted");
        Ok(())
    }

    /// Find the document whose `uuid` field equals `uuid`.
    ///
    /// Returns the document name and content. Unreadable files are skipped.
    pub fn find_by_uuid(&self, database: &str, uuid: &str) -> KvResult<(String, FlatFields)> {
        self.scan(database)?
            .into_iter()
            .find(|(_, fields)| fields.get(UUID_FIELD).and_then(Value::as_str) == Some(uuid))
            .ok_or_else(|| KvError::UuidNotFound {
                database: database.to_string(),
                uuid: uuid.to_string(),
            })
    }

    /// Every readable document in `database`, keyed by name.
    pub fn read_all(&self, database: &str) -> KvResult<BTreeMap<String, FlatFields>> {
        Ok(self.scan(database)?.into_iter().collect())
    }

    /// Best-effort read of every document in `database`.
    ///
    /// Each document is read under its own lock, so a concurrent rewrite is
    /// waited out rather than seen half-written. Documents deleted after the
    /// listing are dropped silently; undecodable or non-object files are
    /// logged and skipped.
    fn scan(&self, database: &str) -> KvResult<Vec<(String, FlatFields)>> {
        let dir = self.flat.database_dir(database)?;
        let names = self.flat.store().list(&dir).map_err(|e| match e {
            StoreError::NotFound { .. } => KvError::DatabaseNotFound {
                database: database.to_string(),
            },
            source => KvError::Store {
                document: database.to_string(),
                source,
            },
        })?;

        let mut documents = Vec::with_capacity(names.len());
        for name in names {
            if let Err(e) = validate_document_key(&name) {
                warn!(database, error = %e, "skipping file");
                continue;
            }
            let path = EntityStore::record_path(&dir, &name);
            let _guard = self.flat.locks().acquire(database, &name);
            match self.flat.read_fields(database, &name, &path) {
                Ok(fields) => documents.push((name, fields)),
                Err(KvError::DocumentNotFound { .. }) => {
                    debug!(database, document = %name, "document removed during scan");
                }
                Err(e) => warn!(database, document = %name, error = %e, "skipping unreadable document"),
            }
        }
        Ok(documents)
    }
}
