use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use burrow_types::METADATA_FILE;

use crate::error::{StoreError, StoreResult};

/// Extension of every record file.
const RECORD_EXTENSION: &str = "json";

/// Encode/decode a single JSON record to/from a file.
///
/// Records are written compactly with a trailing newline. With
/// `sync_writes` enabled every write is followed by `fsync`; this is the
/// strongest durability Burrow offers (a single synchronous write, no
/// write-ahead log, no atomic rename).
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityStore {
    sync_writes: bool,
}

impl EntityStore {
    /// Create a store that relies on OS buffering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable `fsync` after each write.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Path of the record file named `stem` inside `dir`.
    pub fn record_path(dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{stem}.{RECORD_EXTENSION}"))
    }

    /// Whether a record file exists at `path`.
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Write a new record. Fails with `AlreadyExists` if anything is present
    /// at `path`.
    pub fn create<T: Serialize + ?Sized>(&self, path: &Path, record: &T) -> StoreResult<()> {
        let bytes = encode(path, record)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| StoreError::from_io(path, e))?;

        if let Err(e) = self.write_all(&mut file, &bytes) {
            drop(file);
            // Do not leave a truncated record behind for the next load.
            if let Err(cleanup) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %cleanup, "failed to remove partial record");
            }
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }

        debug!(path = %path.display(), bytes = bytes.len(), "record created");
        Ok(())
    }

    /// Replace the full content of an existing record.
    pub fn overwrite<T: Serialize + ?Sized>(&self, path: &Path, record: &T) -> StoreResult<()> {
        if !self.exists(path) {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = encode(path, record)?;

        let mut file = File::create(path).map_err(|e| StoreError::from_io(path, e))?;
        self.write_all(&mut file, &bytes).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), bytes = bytes.len(), "record rewritten");
        Ok(())
    }

    /// Read and decode the record at `path`.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<T> {
        let bytes = fs::read(path).map_err(|e| StoreError::from_io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Delete the record at `path`.
    pub fn remove(&self, path: &Path) -> StoreResult<()> {
        fs::remove_file(path).map_err(|e| StoreError::from_io(path, e))?;
        debug!(path = %path.display(), "record removed");
        Ok(())
    }

    /// Stems of every record file in `dir`, sorted.
    ///
    /// The collection metadata file is not a record and is not listed.
    pub fn list(&self, dir: &Path) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::from_io(dir, e))?;
        let mut stems = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }
            match record_stem(&path) {
                Some(stem) => stems.push(stem.to_string()),
                None => warn!(path = %path.display(), "skipping non UTF-8 file name"),
            }
        }

        stems.sort();
        Ok(stems)
    }

    /// Best-effort read of every record file in `dir`.
    ///
    /// Files that cannot be read or decoded are logged and skipped; only a
    /// failure to list `dir` itself is an error. Results are sorted by path.
    /// Nothing is locked, so a record being rewritten concurrently may be
    /// skipped; callers that own per-record locks should [`list`](Self::list)
    /// and [`load`](Self::load) under them instead.
    pub fn scan<T: DeserializeOwned>(&self, dir: &Path) -> StoreResult<Vec<(PathBuf, T)>> {
        let mut records = Vec::new();
        for stem in self.list(dir)? {
            let path = Self::record_path(dir, &stem);
            match self.load::<T>(&path) {
                Ok(record) => records.push((path, record)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }

        debug!(dir = %dir.display(), count = records.len(), "scanned records");
        Ok(records)
    }

    fn write_all(&self, file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
        file.write_all(bytes)?;
        if self.sync_writes {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// The file stem of a record path (`"a.json"` -> `"a"`).
pub fn record_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn is_record_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().map(|e| e == RECORD_EXTENSION).unwrap_or(false)
        && path.file_name().map(|n| n != METADATA_FILE).unwrap_or(false)
}

fn encode<T: Serialize + ?Sized>(path: &Path, record: &T) -> StoreResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec(record).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: String,
        count: u32,
    }

    fn sample(id: &str) -> Sample {
        Sample {
            id: id.to_string(),
            count: 7,
        }
    }

    #[test]
    fn create_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new();
        let path = EntityStore::record_path(dir.path(), "a");

        store.create(&path, &sample("a")).unwrap();
        let loaded: Sample = store.load(&path).unwrap();
        assert_eq!(loaded, sample("a"));
    }

    #[test]
    fn create_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new();
        let path = EntityStore::record_path(dir.path(), "a");

        store.create(&path, &sample("first")).unwrap();
        let err = store.create(&path, &sample("second")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let loaded: Sample = store.load(&path).unwrap();
        assert_eq!(loaded.id, "first");
    }

    #[test]
    fn create_in_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new();
        let path = dir.path().join("missing").join("a.json");
        let err = store.create(&path, &sample("a")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = EntityStore::new()
            .load::<Value>(&dir.path().join("nope.json"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn load_malformed_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();

        let err = EntityStore::new().load::<Value>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert_eq!(err.kind(), burrow_types::ErrorKind::DecodeFailure);
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new().with_sync_writes(true);
        let path = EntityStore::record_path(dir.path(), "doc");

        store.create(&path, &json!({"a": 1, "b": 2})).unwrap();
        store.overwrite(&path, &json!({"a": 1})).unwrap();

        let loaded: Value = store.load(&path).unwrap();
        assert_eq!(loaded, json!({"a": 1}));
    }

    #[test]
    fn overwrite_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = EntityStore::new()
            .overwrite(&dir.path().join("ghost.json"), &json!({}))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn remove_then_remove_again() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new();
        let path = EntityStore::record_path(dir.path(), "a");

        store.create(&path, &sample("a")).unwrap();
        store.remove(&path).unwrap();
        assert!(!store.exists(&path));

        let err = store.remove(&path).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn scan_skips_bad_files_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new();

        store
            .create(&EntityStore::record_path(dir.path(), "b"), &sample("b"))
            .unwrap();
        store
            .create(&EntityStore::record_path(dir.path(), "a"), &sample("a"))
            .unwrap();
        fs::write(dir.path().join("broken.json"), b"[[[").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::write(dir.path().join(METADATA_FILE), b"{}").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let records: Vec<(PathBuf, Sample)> = store.scan(dir.path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|(_, s)| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(record_stem(&records[0].0), Some("a"));
    }

    #[test]
    fn list_names_only_record_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = EntityStore::new();

        fs::write(dir.path().join("zeta.json"), b"[[[").unwrap();
        fs::write(dir.path().join("alpha.json"), b"{}").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::write(dir.path().join(METADATA_FILE), b"{}").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        // Listing does not decode, so the malformed file is still named.
        assert_eq!(store.list(dir.path()).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn scan_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = EntityStore::new()
            .scan::<Value>(&dir.path().join("gone"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
