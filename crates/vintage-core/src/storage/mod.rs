//! # Storage Backends
//!
//! Persistent `RecordStore` implementations and the backend switch used by
//! the binary.

mod backend;
mod redb_store;

pub use backend::StorageBackend;
pub use redb_store::RedbStore;
