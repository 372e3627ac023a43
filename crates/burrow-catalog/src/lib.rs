//! Hierarchical storage manager for Burrow.
//!
//! Keeps an in-memory mirror of the `database / collection / document`
//! directory tree and arbitrates concurrent access to it. The directory tree
//! is the source of truth; the in-memory maps are caches populated lazily on
//! first use and never proactively invalidated.
//!
//! # Layout
//!
//! ```text
//! {root}/{database}/{collection}/metadata.json
//! {root}/{database}/{collection}/{document id}.json
//! ```
//!
//! # Locking
//!
//! - Each container ([`Registry`], [`Database`], [`Collection`]) guards its
//!   children map with a reader/writer lock: shared for lookups, exclusive
//!   for create, delete, and cache population.
//! - Cache misses re-check under the exclusive lock before loading from disk,
//!   so concurrent first access yields a single in-memory entity.
//! - Each [`Document`] serializes its own field mutations, so writers to
//!   different documents of one collection never contend.
//! - Locks are always taken container first, then child.
//!
//! # Modules
//!
//! - [`registry`]: storage root scan and database lifecycle
//! - [`database`]: collection lifecycle within a database
//! - [`collection`]: document lifecycle, lookup, and rename
//! - [`document`]: per-document field mutations
//! - [`record`]: on-disk record shapes

pub mod collection;
pub mod database;
pub mod document;
pub mod error;
pub mod record;
pub mod registry;

pub use collection::Collection;
pub use database::Database;
pub use document::Document;
pub use error::{CatalogError, CatalogResult};
pub use record::{CollectionMetadata, DocumentRecord, Fields};
pub use registry::Registry;

/// Join path segments with `/` for the relative paths stored in records.
pub(crate) fn relative_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}
