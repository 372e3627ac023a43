//! File-backed entity storage for Burrow.
//!
//! Every persistent record in Burrow -- hierarchical documents, flattened
//! documents, collection metadata -- is a single JSON file at a path derived
//! deterministically from its names. This crate owns the encode/decode and
//! file lifecycle for one such record.
//!
//! # Design Rules
//!
//! 1. `create` never clobbers: it fails if anything already exists at the path.
//! 2. `overwrite` and `remove` only act on records that exist.
//! 3. No locking happens here. Callers serialize access to a given path.
//! 4. All I/O errors are propagated, except in [`EntityStore::scan`], which
//!    is best-effort by contract and logs the files it skips.

pub mod entity;
pub mod error;

pub use entity::{record_stem, EntityStore};
pub use error::{StoreError, StoreResult};
