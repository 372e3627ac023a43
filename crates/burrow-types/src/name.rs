//! Name validation for anything that becomes a path component.
//!
//! Database, collection, and document names map directly onto directory and
//! file names under the storage root, so a name must be a single, safe path
//! segment:
//! - Must be non-empty and at most [`MAX_NAME_LEN`] bytes
//! - Must not contain `/`, `\`, NUL, or control characters
//! - Must not start with `.` (which also rules out `.` and `..`)

use crate::error::TypeError;
use crate::kind::EntityKind;

/// Upper bound on a name's length in bytes (common filesystem limit).
pub const MAX_NAME_LEN: usize = 255;

/// File name of the collection metadata record.
pub const METADATA_FILE: &str = "metadata.json";

/// Document keys that would alias the metadata record.
const RESERVED_DOCUMENT_KEYS: &[&str] = &["metadata"];

/// Characters that are forbidden anywhere in a name.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate a database, collection, or document name.
///
/// # Examples
///
/// ```
/// use burrow_types::{validate_name, EntityKind};
///
/// assert!(validate_name(EntityKind::Database, "inventory").is_ok());
/// assert!(validate_name(EntityKind::Database, "").is_err());
/// assert!(validate_name(EntityKind::Collection, "../escape").is_err());
/// ```
pub fn validate_name(entity: EntityKind, name: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidName {
        entity,
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!("longer than {MAX_NAME_LEN} bytes")));
    }
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(format!("contains forbidden character: {ch:?}")));
        }
    }
    if let Some(ch) = name.chars().find(|c| c.is_control()) {
        return Err(invalid(format!("contains control character: {ch:?}")));
    }
    if name.starts_with('.') {
        return Err(invalid("must not start with '.'".into()));
    }

    Ok(())
}

/// Validate a caller-supplied document key.
///
/// Same rules as [`validate_name`], plus the keys reserved for collection
/// bookkeeping files.
pub fn validate_document_key(key: &str) -> Result<(), TypeError> {
    validate_name(EntityKind::Document, key)?;
    if RESERVED_DOCUMENT_KEYS.contains(&key) {
        return Err(TypeError::InvalidName {
            entity: EntityKind::Document,
            name: key.to_string(),
            reason: "reserved for collection metadata".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_names() {
        for name in ["users", "orders-2024", "a", "with space", "ünïcode", "v1.2"] {
            assert!(validate_name(EntityKind::Collection, name).is_ok(), "{name}");
        }
    }

    #[test]
    fn empty_name_rejected() {
        let err = validate_name(EntityKind::Database, "").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn traversal_rejected() {
        for name in [".", "..", "../etc", "a/b", "a\\b", ".hidden"] {
            assert!(validate_name(EntityKind::Database, name).is_err(), "{name}");
        }
    }

    #[test]
    fn control_characters_rejected() {
        assert!(validate_name(EntityKind::Document, "line\nbreak").is_err());
        assert!(validate_name(EntityKind::Document, "nul\0").is_err());
    }

    #[test]
    fn overlong_name_rejected() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_name(EntityKind::Document, &name).is_err());
        let name = "x".repeat(MAX_NAME_LEN);
        assert!(validate_name(EntityKind::Document, &name).is_ok());
    }

    #[test]
    fn metadata_is_reserved_for_documents_only() {
        assert!(validate_document_key("metadata").is_err());
        assert!(validate_name(EntityKind::Collection, "metadata").is_ok());
    }

    #[test]
    fn error_names_entity() {
        let err = validate_name(EntityKind::Collection, "a/b").unwrap_err();
        assert!(err.to_string().starts_with("invalid collection name 'a/b'"));
    }

    proptest! {
        #[test]
        fn plain_segments_are_accepted(name in "[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,40}") {
            prop_assert!(validate_name(EntityKind::Database, &name).is_ok());
        }

        #[test]
        fn any_slash_is_rejected(prefix in "[a-z]{0,8}", suffix in "[a-z]{0,8}") {
            let name = format!("{prefix}/{suffix}");
            prop_assert!(validate_name(EntityKind::Database, &name).is_err());
        }
    }
}
