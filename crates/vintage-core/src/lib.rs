//! # vintage-core
//!
//! The reconciliation engine for Vintage: versioned statistical records
//! kept in a store, updated by natural key.
//!
//! Fetchers hand the engine candidate `Dataset`, `Series` and `Category`
//! records. The engine inserts new keys, reports field drift on known keys,
//! and merges series observation by observation so that every value keeps
//! the date it was first released and every superseded value stays on
//! record.
//!
//! ## Layout
//!
//! - `types`, `primitives`: identities, collections, errors, limits
//! - `series`, `dataset`, `category`: validated record kinds
//! - `drift`, `merge`, `reconciler`: the Lookup-and-Merge engine
//! - `store`, `storage`, `formats`: in-memory and redb stores, snapshots
//! - `query`: revision history and store metrics
//!
//! ## Constraints
//!
//! - No async, no network: reconciliation is a synchronous read-modify-write
//! - Deterministic: `BTreeMap` everywhere, no floating-point arithmetic
//! - Observation values are opaque strings and never parsed

// =============================================================================
// MODULES
// =============================================================================

pub mod category;
pub mod config;
pub mod dataset;
pub mod drift;
pub mod formats;
pub mod merge;
pub mod primitives;
pub mod query;
pub mod reconciler;
pub mod record;
pub mod schema;
pub mod series;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Collection, RecordId, ReleaseDate, Revisions, VintageError};

// =============================================================================
// RE-EXPORTS: Records
// =============================================================================

pub use category::{Category, CategoryDraft};
pub use dataset::{Dataset, DatasetDraft};
pub use record::Record;
pub use schema::{CATEGORY_SCHEMA, DATASET_SCHEMA, SERIES_SCHEMA, Schema};
pub use series::{Observation, Series, SeriesBuilder, SeriesDraft};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use config::{BackendKind, ReconcilerConfig, StorageConfig, VintageConfig};
pub use drift::{Drift, DriftSink, RecordingSink, TracingSink, detect};
pub use merge::merge_series;
pub use query::{PeriodHistory, RevisionHistory, StoreMetrics, series_revision_history};
pub use reconciler::{Outcome, Reconciler, Reconciliation};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use formats::{MAX_SNAPSHOT_SIZE, SnapshotHeader, store_from_bytes, store_to_bytes};
pub use storage::{RedbStore, StorageBackend};
pub use store::{MemoryStore, RecordStore, Stored, TypedStore};
