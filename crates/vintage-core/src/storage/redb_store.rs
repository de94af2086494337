//! # redb-backed Record Storage
//!
//! A disk-backed record store using the redb embedded database, providing:
//! - ACID transactions (each insert or update is one write transaction)
//! - Crash safety (copy-on-write B-trees)
//! - A single writer per database file (redb holds an exclusive lock)
//!
//! ## Layout
//!
//! Per collection, one row table (`id -> postcard bytes`) and one key index
//! (`natural key -> id`). A shared metadata table keeps the next identity.

use crate::store::RecordStore;
use crate::{Collection, RecordId, VintageError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::fmt::Display;
use std::path::Path;

type Rows = TableDefinition<'static, u64, &'static [u8]>;
type Index = TableDefinition<'static, &'static str, u64>;

const DATASET_ROWS: Rows = TableDefinition::new("datasets");
const DATASET_INDEX: Index = TableDefinition::new("datasets_by_key");
const SERIES_ROWS: Rows = TableDefinition::new("series");
const SERIES_INDEX: Index = TableDefinition::new("series_by_key");
const CATEGORY_ROWS: Rows = TableDefinition::new("categories");
const CATEGORY_INDEX: Index = TableDefinition::new("categories_by_key");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_ID: &str = "next_record_id";

const fn tables(collection: Collection) -> (Rows, Index) {
    match collection {
        Collection::Datasets => (DATASET_ROWS, DATASET_INDEX),
        Collection::Series => (SERIES_ROWS, SERIES_INDEX),
        Collection::Categories => (CATEGORY_ROWS, CATEGORY_INDEX),
    }
}

fn storage(e: impl Display) -> VintageError {
    VintageError::Storage(e.to_string())
}

/// A disk-backed record store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Next available record identity.
    next_id: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a record database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, VintageError> {
        let db = Database::create(path.as_ref()).map_err(storage)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage)?;
            for collection in Collection::ALL {
                let (rows, index) = tables(collection);
                write_txn.open_table(rows).map_err(storage)?;
                write_txn.open_table(index).map_err(storage)?;
            }
            write_txn.open_table(METADATA).map_err(storage)?;
            write_txn.commit().map_err(storage)?;
        }

        let next_id = {
            let read_txn = db.begin_read().map_err(storage)?;
            let table = read_txn.open_table(METADATA).map_err(storage)?;
            table
                .get(NEXT_ID)
                .map_err(storage)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        tracing::debug!(path = %path.as_ref().display(), next_id, "opened redb store");
        Ok(Self { db, next_id })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<bool, VintageError> {
        self.db.compact().map_err(storage)
    }

    /// Identity the next insert will receive.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }
}

// =============================================================================
// RECORDSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl RecordStore for RedbStore {
    fn find_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<(RecordId, Vec<u8>)>, VintageError> {
        let (rows, index) = tables(collection);
        let read_txn = self.db.begin_read().map_err(storage)?;

        let index_table = read_txn.open_table(index).map_err(storage)?;
        let Some(id) = index_table.get(key).map_err(storage)?.map(|v| v.value()) else {
            return Ok(None);
        };

        let rows_table = read_txn.open_table(rows).map_err(storage)?;
        let bytes = rows_table
            .get(id)
            .map_err(storage)?
            .map(|v| v.value().to_vec())
            .ok_or_else(|| {
                VintageError::Storage(format!(
                    "{collection}: key {key} points at missing record #{id}"
                ))
            })?;
        Ok(Some((RecordId(id), bytes)))
    }

    fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Vec<u8>>, VintageError> {
        let (rows, _) = tables(collection);
        let read_txn = self.db.begin_read().map_err(storage)?;
        let rows_table = read_txn.open_table(rows).map_err(storage)?;
        let bytes = rows_table
            .get(id.0)
            .map_err(storage)?
            .map(|v| v.value().to_vec());
        Ok(bytes)
    }

    fn insert(
        &mut self,
        collection: Collection,
        key: &str,
        payload: &[u8],
    ) -> Result<RecordId, VintageError> {
        let (rows, index) = tables(collection);
        let id = self.next_id;
        let next_id = id.saturating_add(1);

        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut index_table = write_txn.open_table(index).map_err(storage)?;
            if index_table.get(key).map_err(storage)?.is_some() {
                return Err(VintageError::DuplicateKey {
                    collection,
                    key: key.to_string(),
                });
            }
            index_table.insert(key, id).map_err(storage)?;

            let mut rows_table = write_txn.open_table(rows).map_err(storage)?;
            rows_table.insert(id, payload).map_err(storage)?;

            let mut meta_table = write_txn.open_table(METADATA).map_err(storage)?;
            meta_table.insert(NEXT_ID, next_id).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        // Update in-memory state only after successful commit.
        self.next_id = next_id;
        Ok(RecordId(id))
    }

    fn update(
        &mut self,
        collection: Collection,
        id: RecordId,
        payload: &[u8],
    ) -> Result<(), VintageError> {
        let (rows, _) = tables(collection);
        let write_txn = self.db.begin_write().map_err(storage)?;
        {
            let mut rows_table = write_txn.open_table(rows).map_err(storage)?;
            if rows_table.get(id.0).map_err(storage)?.is_none() {
                return Err(VintageError::RecordNotFound { collection, id });
            }
            rows_table.insert(id.0, payload).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;
        Ok(())
    }

    fn count(&self, collection: Collection) -> Result<usize, VintageError> {
        let (rows, _) = tables(collection);
        let read_txn = self.db.begin_read().map_err(storage)?;
        let rows_table = read_txn.open_table(rows).map_err(storage)?;
        let count = rows_table.len().map_err(storage)?;
        Ok(count as usize)
    }

    fn keys(&self, collection: Collection) -> Result<Vec<String>, VintageError> {
        let (_, index) = tables(collection);
        let read_txn = self.db.begin_read().map_err(storage)?;
        let index_table = read_txn.open_table(index).map_err(storage)?;

        let mut keys = Vec::new();
        for entry in index_table.iter().map_err(storage)? {
            let (key, _) = entry.map_err(storage)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
