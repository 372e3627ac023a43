//! High-level SDK for Burrow.
//!
//! [`Burrow`] is the single entry point for applications embedding the
//! store: it reads a [`StorageConfig`], opens the storage root, and hands out
//! either the hierarchical [`Registry`] or the flattened [`FlatStore`]
//! depending on the configured [`Layout`].
//!
//! ```no_run
//! use burrow_sdk::{Burrow, StorageConfig};
//!
//! let burrow = Burrow::open(StorageConfig::new("/tmp/burrow"))?;
//! burrow.create_database("shop")?.create_collection("orders")?;
//! let orders = burrow.collection("shop", "orders")?;
//! let order = orders.create(None, Default::default())?;
//! order.add("total", 42.into())?;
//! # Ok::<(), burrow_sdk::SdkError>(())
//! ```

pub mod config;
pub mod error;
pub mod handle;

pub use config::{Layout, StorageConfig};
pub use error::{SdkError, SdkResult};
pub use handle::Burrow;

// Re-export key types
pub use burrow_catalog::{Collection, Database, Document, DocumentRecord, Fields, Registry};
pub use burrow_kv::{FlatDocuments, FlatFields, FlatStore, KeyValueMutator};
pub use burrow_types::{AddressingMode, DocumentId, ErrorKind};
