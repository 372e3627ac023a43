//! Flattened document storage for Burrow.
//!
//! In the flattened layout each document is a single JSON object at
//! `{root}/{database}/{document}.json`, with no collection level. Every
//! operation on a document runs under that document's entry in a shared
//! [`DocumentLocks`] table, so mutations of one document are linearized and
//! different documents never wait on each other.
//!
//! # Key Types
//!
//! - [`FlatStore`]: root directory plus the shared lock table
//! - [`KeyValueMutator`]: `set_key` / `get_key` / `delete_key`
//! - [`FlatDocuments`]: whole-document create, read, merge, delete, search

pub mod documents;
pub mod error;
pub mod flat;
pub mod locks;
pub mod mutator;

pub use documents::{FlatDocuments, UUID_FIELD};
pub use error::{KvError, KvResult};
pub use flat::{FlatFields, FlatStore};
pub use locks::{DocumentGuard, DocumentLocks};
pub use mutator::KeyValueMutator;
