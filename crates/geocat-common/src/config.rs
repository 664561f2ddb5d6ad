//! Configuration types for Geocat
//!
//! The catalog is configured from an optional TOML file layered with
//! `GEOCAT_`-prefixed environment variables.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding file configuration
pub const ENV_PREFIX: &str = "GEOCAT";

/// Root configuration for a catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding one sub-directory per record kind
    pub root_dir: PathBuf,
    /// Record file format
    pub codec: CodecKind,
    /// What to do when a write collides with an existing key
    pub duplicate_policy: DuplicatePolicy,
    /// fsync every record file before it is renamed into place
    pub sync_writes: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("/var/lib/geocat"),
            codec: CodecKind::Json,
            duplicate_policy: DuplicatePolicy::Reject,
            sync_writes: true,
        }
    }
}

impl CatalogConfig {
    /// Create config rooted at the given directory
    pub fn with_root_dir(root_dir: impl AsRef<Path>) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Load configuration from defaults, an optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| Error::configuration(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::configuration(e.to_string()))
    }
}

/// On-disk record format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// Pretty-printed JSON (`.json`)
    #[default]
    Json,
    /// bincode (`.bin`)
    Bincode,
}

/// Behavior of a write whose key is already taken
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateKey` / `UniqueViolation`
    #[default]
    Reject,
    /// Accept the write; a shared unique key resolves to the greatest key
    Overwrite,
}
