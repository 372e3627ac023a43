//! Foundation types for Burrow.
//!
//! This crate provides the naming, identity, and error-classification types
//! shared by every other Burrow crate.
//!
//! # Key Types
//!
//! - [`DocumentId`]: generated document identifier (UUID v7)
//! - [`AddressingMode`]: how documents are addressed in a deployment
//! - [`EntityKind`]: database, collection, or document
//! - [`ErrorKind`]: the transport-neutral failure classification every
//!   crate error maps onto
//! - [`validate_name`] / [`validate_document_key`]: name rules for anything
//!   that becomes a path component

pub mod error;
pub mod id;
pub mod kind;
pub mod mode;
pub mod name;

pub use error::TypeError;
pub use id::DocumentId;
pub use kind::{EntityKind, ErrorKind};
pub use mode::AddressingMode;
pub use name::{validate_document_key, validate_name, MAX_NAME_LEN, METADATA_FILE};
