//! # Formats
//!
//! On-disk formats owned by the engine.

mod persistence;

pub use persistence::{MAX_SNAPSHOT_SIZE, SnapshotHeader, store_from_bytes, store_to_bytes};
