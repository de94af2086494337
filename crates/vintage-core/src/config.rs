//! # Configuration
//!
//! Explicit run configuration, constructed once per run and handed to the
//! reconciler and the storage backend at construction. Nothing here is
//! process-global.
//!
//! The structures deserialize from the `vintage.toml` layout:
//!
//! ```toml
//! [reconciler]
//! namespace = "widukind"
//!
//! [storage]
//! backend = "redb"
//! path = "vintage.db"
//! ```

use crate::primitives::DEFAULT_NAMESPACE;
use crate::record::require_text;
use crate::{Collection, VintageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// redb database file (ACID, written on every upsert).
    #[default]
    Redb,
    /// In-memory store snapshotted to a file after each run.
    File,
    /// In-memory store, discarded at exit.
    Memory,
}

impl FromStr for BackendKind {
    type Err = VintageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(VintageError::Config(format!(
                "unknown backend '{other}' (expected redb, file or memory)"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Redb => "redb",
            Self::File => "file",
            Self::Memory => "memory",
        })
    }
}

/// Where and how records are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: PathBuf::from("vintage.db"),
        }
    }
}

/// Settings of the reconciliation engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcilerConfig {
    /// Prefix of the collection labels carried by drift events.
    pub namespace: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ReconcilerConfig {
    /// Qualified label of a collection, `namespace.collection`.
    #[must_use]
    pub fn collection_label(&self, collection: Collection) -> String {
        format!("{}.{}", self.namespace, collection.name())
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VintageConfig {
    pub reconciler: ReconcilerConfig,
    pub storage: StorageConfig,
}

impl VintageConfig {
    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), VintageError> {
        require_text("namespace", &self.reconciler.namespace)
            .map_err(|e| VintageError::Config(e.to_string()))?;
        if self.reconciler.namespace.contains('.') {
            return Err(VintageError::Config(format!(
                "namespace '{}' must not contain '.'",
                self.reconciler.namespace
            )));
        }
        if self.storage.backend != BackendKind::Memory
            && self.storage.path.as_os_str().is_empty()
        {
            return Err(VintageError::Config(format!(
                "storage.path is required for the {} backend",
                self.storage.backend
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = VintageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, BackendKind::Redb);
        assert_eq!(config.reconciler.namespace, "vintage");
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("REDB".parse::<BackendKind>().ok(), Some(BackendKind::Redb));
        assert_eq!("file".parse::<BackendKind>().ok(), Some(BackendKind::File));
        assert!("mongo".parse::<BackendKind>().is_err());
    }

    #[test]
    fn dotted_namespace_rejected() {
        let mut config = VintageConfig::default();
        config.reconciler.namespace = "a.b".to_string();
        assert!(matches!(config.validate(), Err(VintageError::Config(_))));
    }

    #[test]
    fn file_backend_needs_path() {
        let mut config = VintageConfig::default();
        config.storage.backend = BackendKind::File;
        config.storage.path = PathBuf::new();
        assert!(config.validate().is_err());

        config.storage.backend = BackendKind::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn collection_label_is_qualified() {
        let config = ReconcilerConfig {
            namespace: "widukind".to_string(),
        };
        assert_eq!(config.collection_label(Collection::Series), "widukind.series");
    }
}
