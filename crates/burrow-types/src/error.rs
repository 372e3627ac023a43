use thiserror::Error;

use crate::kind::{EntityKind, ErrorKind};

/// Errors produced by type-level validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {entity} name '{name}': {reason}")]
    InvalidName {
        entity: EntityKind,
        name: String,
        reason: String,
    },

    #[error("unknown addressing mode: {0}")]
    UnknownAddressingMode(String),
}

impl TypeError {
    /// Classification for the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName { .. } => ErrorKind::InvalidName,
            Self::UnknownAddressingMode(_) => ErrorKind::InvalidConfig,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let name = TypeError::InvalidName {
            entity: EntityKind::Collection,
            name: "a/b".into(),
            reason: "contains forbidden character: '/'".into(),
        };
        assert_eq!(name.kind(), ErrorKind::InvalidName);
        assert_eq!(
            name.to_string(),
            "invalid collection name 'a/b': contains forbidden character: '/'"
        );
        assert_eq!(
            TypeError::UnknownAddressingMode("both".into()).kind(),
            ErrorKind::InvalidConfig
        );
    }
}
