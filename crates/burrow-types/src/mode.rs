use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How documents in a hierarchical deployment are addressed.
///
/// Exactly one mode is active per deployment; it is fixed when the registry
/// is constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    /// Documents get a generated [`DocumentId`](crate::DocumentId) and are
    /// addressed by it. Documents carry no name.
    #[default]
    Generated,
    /// Documents are addressed by a caller-supplied name. The name given at
    /// creation doubles as the identifier and file stem; `rename` changes the
    /// descriptive name only.
    Named,
}

impl AddressingMode {
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named)
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Named => write!(f, "named"),
        }
    }
}

impl FromStr for AddressingMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generated" | "id" => Ok(Self::Generated),
            "named" | "name" => Ok(Self::Named),
            other => Err(TypeError::UnknownAddressingMode(other.to_string())),
        }
    }
}
