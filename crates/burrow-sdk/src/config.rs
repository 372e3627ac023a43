//! Storage configuration, read from `burrow.toml` and the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use burrow_types::AddressingMode;

use crate::error::{SdkError, SdkResult};

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "burrow.toml";

/// Root used when neither the file nor the environment names one.
pub const DEFAULT_ROOT: &str = "./burrow-data";

/// Overrides [`StorageConfig::root`].
pub const ENV_BASE_PATH: &str = "BURROW_BASE_PATH";
/// Older name for [`ENV_BASE_PATH`], read only when that one is unset.
pub const ENV_LEGACY_BASE_PATH: &str = "BASE_PATH";
/// Overrides [`StorageConfig::layout`].
pub const ENV_LAYOUT: &str = "BURROW_LAYOUT";
/// Overrides [`StorageConfig::addressing`].
pub const ENV_ADDRESSING: &str = "BURROW_ADDRESSING";

/// On-disk arrangement of documents under the root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `{root}/{db}/{collection}/{id}.json`
    #[default]
    Hierarchical,
    /// `{root}/{db}/{document}.json`
    Flattened,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hierarchical => write!(f, "hierarchical"),
            Self::Flattened => write!(f, "flattened"),
        }
    }
}

impl FromStr for Layout {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hierarchical" => Ok(Self::Hierarchical),
            "flattened" | "flat" => Ok(Self::Flattened),
            other => Err(SdkError::Config(format!(
                "unknown layout '{other}', expected \"hierarchical\" or \"flattened\""
            ))),
        }
    }
}

/// Storage configuration.
///
/// # Example
///
/// ```toml
/// root = "/var/lib/burrow"
/// layout = "hierarchical"   # or "flattened"
/// addressing = "generated"  # or "named" (hierarchical only)
/// sync_writes = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage root directory; created on open if missing.
    pub root: PathBuf,
    pub layout: Layout,
    pub addressing: AddressingMode,
    /// fsync every record write before returning.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            layout: Layout::default(),
            addressing: AddressingMode::default(),
            sync_writes: false,
        }
    }
}

impl StorageConfig {
    /// Defaults with the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_addressing(mut self, addressing: AddressingMode) -> Self {
        self.addressing = addressing;
        self
    }

    pub fn from_toml_str(content: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SdkError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> SdkResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `BURROW_*` variables (and `BASE_PATH`) from the process
    /// environment.
    pub fn with_env_overrides(self) -> SdkResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source. Empty values are ignored.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> SdkResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(root) = var(ENV_BASE_PATH).or_else(|| var(ENV_LEGACY_BASE_PATH)) {
            self.root = PathBuf::from(root);
        }
        if let Some(layout) = var(ENV_LAYOUT) {
            self.layout = layout.parse()?;
        }
        if let Some(addressing) = var(ENV_ADDRESSING) {
            self.addressing = addressing.parse()?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(SdkError::Config("root must not be empty".into()));
        }
        if self.layout == Layout::Flattened && self.addressing.is_named() {
            return Err(SdkError::Config(
                "named addressing is only available with the hierarchical layout".into(),
            ));
        }
        Ok(())
    }

    /// Serialize and write to `path`.
    pub fn write_to_file(&self, path: &Path) -> SdkResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SdkError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content).map_err(|source| SdkError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }
}
