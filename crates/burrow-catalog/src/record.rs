//! On-disk record shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document's payload: an arbitrary JSON object.
pub type Fields = Map<String, Value>;

/// A hierarchical document as written to `{collection}/{id}.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Identifier; equals the file stem.
    pub id: String,
    /// Descriptive name (name-addressed deployments only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Location relative to the storage root.
    pub path: String,
    /// Caller payload.
    #[serde(default)]
    pub data: Fields,
}

/// Descriptive metadata written to `{collection}/metadata.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub name: String,
    /// Location relative to the storage root.
    pub path: String,
    /// Ids of the documents cached when the metadata was last saved.
    #[serde(default)]
    pub documents: Vec<String>,
}
