//! # Record Store
//!
//! The storage collection abstraction the reconcilers run against, and its
//! deterministic in-memory implementation.
//!
//! Stores deal in encoded payloads keyed by natural key; typed access lives
//! in the blanket `TypedStore` extension. All maps are `BTreeMap` for
//! deterministic ordering.

use crate::record::{Record, decode, encode};
use crate::{Collection, RecordId, VintageError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// RECORDSTORE TRAIT
// =============================================================================

/// Storage operations required by the reconcilers.
///
/// Implementations must keep at most one record per natural key in each
/// collection and must scope `update` to the single identified record.
pub trait RecordStore {
    /// Find the record whose natural key equals `key`.
    fn find_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<(RecordId, Vec<u8>)>, VintageError>;

    /// Fetch a record by identity.
    fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Vec<u8>>, VintageError>;

    /// Insert a new record and return its freshly assigned identity.
    ///
    /// Fails with `DuplicateKey` if `key` is already present.
    fn insert(
        &mut self,
        collection: Collection,
        key: &str,
        payload: &[u8],
    ) -> Result<RecordId, VintageError>;

    /// Replace the payload of an existing record, keeping its identity.
    ///
    /// Fails with `RecordNotFound` if `id` does not exist.
    fn update(
        &mut self,
        collection: Collection,
        id: RecordId,
        payload: &[u8],
    ) -> Result<(), VintageError>;

    /// Number of records in a collection.
    fn count(&self, collection: Collection) -> Result<usize, VintageError>;

    /// Natural keys of a collection, in key order.
    fn keys(&self, collection: Collection) -> Result<Vec<String>, VintageError>;
}

/// A decoded record together with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<R> {
    pub id: RecordId,
    pub record: R,
}

/// Typed access on top of any `RecordStore`.
pub trait TypedStore: RecordStore {
    /// Find and decode the record of type `R` with natural key `key`.
    fn find_record<R: Record>(&self, key: &str) -> Result<Option<Stored<R>>, VintageError> {
        self.find_by_key(R::SCHEMA.collection, key)?
            .map(|(id, bytes)| {
                Ok(Stored {
                    id,
                    record: decode(&bytes)?,
                })
            })
            .transpose()
    }

    /// Encode and insert a new record.
    fn insert_record<R: Record>(&mut self, record: &R) -> Result<RecordId, VintageError> {
        let payload = encode(record)?;
        self.insert(R::SCHEMA.collection, record.natural_key(), &payload)
    }

    /// Encode and overwrite the record with identity `id`.
    fn update_record<R: Record>(&mut self, id: RecordId, record: &R) -> Result<(), VintageError> {
        let payload = encode(record)?;
        self.update(R::SCHEMA.collection, id, &payload)
    }

    /// Decode every record of type `R`, in key order.
    fn all_records<R: Record>(&self) -> Result<Vec<Stored<R>>, VintageError> {
        let mut records = Vec::new();
        for key in self.keys(R::SCHEMA.collection)? {
            if let Some(stored) = self.find_record(&key)? {
                records.push(stored);
            }
        }
        Ok(records)
    }
}

impl<S: RecordStore + ?Sized> TypedStore for S {}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// One collection held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Table {
    /// Identity -> encoded record.
    rows: BTreeMap<RecordId, Vec<u8>>,
    /// Natural key -> identity.
    index: BTreeMap<String, RecordId>,
}

/// Deterministic in-memory record store.
///
/// Cloneable, and serializable through the snapshot format in
/// [`formats`](crate::formats).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    tables: BTreeMap<Collection, Table>,
    next_id: u64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity the next insert will receive.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Check the key index against the rows after loading a snapshot.
    pub(crate) fn check_integrity(&self) -> Result<(), VintageError> {
        for (collection, table) in &self.tables {
            if table.index.len() != table.rows.len() {
                return Err(VintageError::Deserialization(format!(
                    "{collection}: {} keys for {} records",
                    table.index.len(),
                    table.rows.len()
                )));
            }
            for (key, id) in &table.index {
                if !table.rows.contains_key(id) || id.0 >= self.next_id {
                    return Err(VintageError::Deserialization(format!(
                        "{collection}: key {key} points at unknown record {id}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn find_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<(RecordId, Vec<u8>)>, VintageError> {
        let Some(table) = self.tables.get(&collection) else {
            return Ok(None);
        };
        Ok(table
            .index
            .get(key)
            .and_then(|id| table.rows.get(id).map(|bytes| (*id, bytes.clone()))))
    }

    fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Vec<u8>>, VintageError> {
        Ok(self
            .tables
            .get(&collection)
            .and_then(|table| table.rows.get(&id))
            .cloned())
    }

    fn insert(
        &mut self,
        collection: Collection,
        key: &str,
        payload: &[u8],
    ) -> Result<RecordId, VintageError> {
        let table = self.tables.entry(collection).or_default();
        if table.index.contains_key(key) {
            return Err(VintageError::DuplicateKey {
                collection,
                key: key.to_string(),
            });
        }

        let id = RecordId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        table.rows.insert(id, payload.to_vec());
        table.index.insert(key.to_string(), id);
        Ok(id)
    }

    fn update(
        &mut self,
        collection: Collection,
        id: RecordId,
        payload: &[u8],
    ) -> Result<(), VintageError> {
        let row = self
            .tables
            .get_mut(&collection)
            .and_then(|table| table.rows.get_mut(&id))
            .ok_or(VintageError::RecordNotFound { collection, id })?;
        *row = payload.to_vec();
        Ok(())
    }

    fn count(&self, collection: Collection) -> Result<usize, VintageError> {
        Ok(self
            .tables
            .get(&collection)
            .map_or(0, |table| table.rows.len()))
    }

    fn keys(&self, collection: Collection) -> Result<Vec<String>, VintageError> {
        Ok(self
            .tables
            .get(&collection)
            .map(|table| table.index.keys().cloned().collect())
            .unwrap_or_default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
