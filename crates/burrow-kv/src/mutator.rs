//! Key-level read-modify-write on flattened documents.

use serde_json::Value;
use tracing::debug;

use crate::error::{KvError, KvResult};
use crate::flat::FlatStore;

/// Sets, reads, and deletes individual top-level keys.
///
/// Every call holds the lock for its `(database, document)` pair across the
/// full read, check, and rewrite, so concurrent mutations of one document
/// are linearized while other documents proceed untouched.
#[derive(Clone, Debug)]
pub struct KeyValueMutator {
    flat: FlatStore,
}

impl KeyValueMutator {
    pub(crate) fn new(flat: FlatStore) -> Self {
        Self { flat }
    }

    /// Insert or replace `key`. The document must already exist.
    pub fn set_key(&self, database: &str, document: &str, key: &str, value: Value) -> KvResult<()> {
        let path = self.flat.document_path(database, document)?;
        let _guard = self.flat.locks().acquire(database, document);

        let mut fields = self.flat.read_fields(database, document, &path)?;
        fields.insert(key.to_string(), value);
        self.flat.write_fields(database, document, &path, &fields)?;

        debug!(database, document, key, "key set");
        Ok(())
    }

    pub fn get_key(&self, database: &str, document: &str, key: &str) -> KvResult<Value> {
        let path = self.flat.document_path(database, document)?;
        let _guard = self.flat.locks().acquire(database, document);

        let mut fields = self.flat.read_fields(database, document, &path)?;
        fields.remove(key).ok_or_else(|| KvError::KeyNotFound {
            document: document.to_string(),
            key: key.to_string(),
        })
    }

    /// Remove `key`, returning its last value.
    pub fn delete_key(&self, database: &str, document: &str, key: &str) -> KvResult<Value> {
        let path = self.flat.document_path(database, document)?;
        let _guard = self.flat.locks().acquire(database, document);

        let mut fields = self.flat.read_fields(database, document, &path)?;
        let previous = fields.remove(key).ok_or_else(|| KvError::KeyNotFound {
            document: document.to_string(),
            key: key.to_string(),
        })?;
        self.flat.write_fields(database, document, &path, &fields)?;

        debug!(database, document, key, "key deleted");
        Ok(previous)
    }
}
