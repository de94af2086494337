//! # Storage Backend Switch
//!
//! Selects the concrete store from a `StorageConfig`:
//! - `Redb`: `RedbStore`, every write is durable immediately
//! - `File`: `MemoryStore` loaded from and saved to a snapshot file
//! - `Memory`: `MemoryStore`, volatile

use super::RedbStore;
use crate::config::{BackendKind, StorageConfig};
use crate::formats::{store_from_bytes, store_to_bytes};
use crate::store::{MemoryStore, RecordStore};
use crate::{Collection, RecordId, VintageError};
use std::path::PathBuf;

/// Storage backend of a run.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store, optionally tied to a snapshot file.
    InMemory {
        store: MemoryStore,
        snapshot: Option<PathBuf>,
    },
    /// Disk-backed store using redb.
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory {
            store: MemoryStore::new(),
            snapshot: None,
        }
    }
}

impl StorageBackend {
    /// Open the backend described by `config`.
    ///
    /// A missing snapshot file yields an empty store; it is created on `persist`.
    pub fn open(config: &StorageConfig) -> Result<Self, VintageError> {
        match config.backend {
            BackendKind::Redb => Ok(Self::Persistent(RedbStore::open(&config.path)?)),
            BackendKind::File => {
                let store = if config.path.exists() {
                    let data = std::fs::read(&config.path).map_err(|e| {
                        VintageError::Storage(format!(
                            "Read snapshot {}: {}",
                            config.path.display(),
                            e
                        ))
                    })?;
                    store_from_bytes(&data)?
                } else {
                    MemoryStore::new()
                };
                Ok(Self::InMemory {
                    store,
                    snapshot: Some(config.path.clone()),
                })
            }
            BackendKind::Memory => Ok(Self::default()),
        }
    }

    /// Check if writes are durable without an explicit `persist`.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }

    /// Write the snapshot file for the file backend; no-op otherwise.
    pub fn persist(&self) -> Result<(), VintageError> {
        let Self::InMemory {
            store,
            snapshot: Some(path),
        } = self
        else {
            return Ok(());
        };

        let data = store_to_bytes(store)?;
        std::fs::write(path, &data).map_err(|e| {
            VintageError::Storage(format!("Write snapshot {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "snapshot written");
        Ok(())
    }

    fn store(&self) -> &dyn RecordStore {
        match self {
            Self::InMemory { store, .. } => store,
            Self::Persistent(redb) => redb,
        }
    }

    fn store_mut(&mut self) -> &mut dyn RecordStore {
        match self {
            Self::InMemory { store, .. } => store,
            Self::Persistent(redb) => redb,
        }
    }
}

impl RecordStore for StorageBackend {
    fn find_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<(RecordId, Vec<u8>)>, VintageError> {
        self.store().find_by_key(collection, key)
    }

    fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Vec<u8>>, VintageError> {
        self.store().get(collection, id)
    }

    fn insert(
        &mut self,
        collection: Collection,
        key: &str,
        payload: &[u8],
    ) -> Result<RecordId, VintageError> {
        self.store_mut().insert(collection, key, payload)
    }

    fn update(
        &mut self,
        collection: Collection,
        id: RecordId,
        payload: &[u8],
    ) -> Result<(), VintageError> {
        self.store_mut().update(collection, id, payload)
    }

    fn count(&self, collection: Collection) -> Result<usize, VintageError> {
        self.store().count(collection)
    }

    fn keys(&self, collection: Collection) -> Result<Vec<String>, VintageError> {
        self.store().keys(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_backend_is_volatile() {
        let config = StorageConfig {
            backend: BackendKind::Memory,
            path: PathBuf::new(),
        };
        let mut backend = StorageBackend::open(&config).expect("open");
        backend.insert(Collection::Series, "A", b"a").expect("insert");
        backend.persist().expect("persist is a no-op");
        assert!(!backend.is_persistent());
    }

    #[test]
    fn file_backend_round_trips_through_snapshot() {
        let temp = tempdir().expect("temp dir");
        let config = StorageConfig {
            backend: BackendKind::File,
            path: temp.path().join("store.vntg"),
        };

        let id = {
            let mut backend = StorageBackend::open(&config).expect("open");
            let id = backend.insert(Collection::Series, "A", b"a").expect("insert");
            backend.persist().expect("persist");
            id
        };

        let backend = StorageBackend::open(&config).expect("reopen");
        let (found, bytes) = backend
            .find_by_key(Collection::Series, "A")
            .expect("find")
            .expect("present");
        assert_eq!(found, id);
        assert_eq!(bytes, b"a");
    }

    #[test]
    fn redb_backend_is_persistent() {
        let temp = tempdir().expect("temp dir");
        let config = StorageConfig {
            backend: BackendKind::Redb,
            path: temp.path().join("store.redb"),
        };
        let backend = StorageBackend::open(&config).expect("open");
        assert!(backend.is_persistent());
        assert_eq!(backend.count(Collection::Datasets).expect("count"), 0);
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("store.vntg");
        std::fs::write(&path, b"not a snapshot").expect("write");

        let config = StorageConfig {
            backend: BackendKind::File,
            path,
        };
        assert!(StorageBackend::open(&config).is_err());
    }
}
