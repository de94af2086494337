//! # Core Type Definitions
//!
//! This module contains the shared types of the Vintage engine:
//! - Storage identity (`RecordId`)
//! - Collections (`Collection`)
//! - Observation history primitives (`ReleaseDate`, `Revisions`)
//! - Error types (`VintageError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use integer arithmetic only (no floating-point)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Store-assigned identity of a persisted record.
///
/// Identities are handed out monotonically by the store and never reused.
/// The natural key of a record (series `key`, `datasetCode`, ...) maps to
/// exactly one identity for the lifetime of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Get the raw identity value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// OBSERVATION HISTORY
// =============================================================================

/// Instant at which an observation value was first learned.
pub type ReleaseDate = DateTime<Utc>;

/// Revision log of one observation.
///
/// Maps the release date at which a superseding value was learned to the
/// value it superseded. Ordered by release date.
pub type Revisions = BTreeMap<ReleaseDate, String>;

// =============================================================================
// COLLECTIONS
// =============================================================================

/// The collections a store keeps, one per record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// Dataset metadata records.
    Datasets,
    /// Time series records.
    Series,
    /// Category tree nodes.
    Categories,
}

impl Collection {
    /// All collections in deterministic order.
    pub const ALL: [Self; 3] = [Self::Datasets, Self::Series, Self::Categories];

    /// Storage name of the collection.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Datasets => "datasets",
            Self::Series => "series",
            Self::Categories => "categories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Vintage engine.
///
/// Field drift is NOT an error: it is reported through a
/// [`DriftSink`](crate::drift::DriftSink) and never blocks a write.
#[derive(Debug, Error)]
pub enum VintageError {
    /// A candidate record is malformed (missing fields, misaligned sequences).
    /// Raised before any store access.
    #[error("Invalid record: {0}")]
    Validation(String),

    /// The store already holds a record with this natural key.
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey {
        /// Collection the insert targeted.
        collection: Collection,
        /// Offending natural key.
        key: String,
    },

    /// Merging a valid candidate would span more periods than a series may hold.
    /// Raised by the merge step; the stored record is left untouched.
    #[error("Merged range [{start}, {end}] of series {key} exceeds {limit} observations")]
    RangeTooWide {
        /// Natural key of the series.
        key: String,
        /// First period of the union range.
        start: i64,
        /// Last period of the union range.
        end: i64,
        /// Maximum number of observations per series.
        limit: usize,
    },

    /// No record exists for the given natural key.
    #[error("No record in {collection} with key {key}")]
    KeyNotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Natural key that was looked up.
        key: String,
    },

    /// No record exists for the given identity.
    #[error("No record in {collection} with id {id}")]
    RecordNotFound {
        /// Collection that was searched.
        collection: Collection,
        /// Identity that was looked up.
        id: RecordId,
    },

    /// Encoding a record failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Decoding a stored record failed.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The underlying store failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An input or output file could not be accessed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl VintageError {
    /// Shorthand for a validation failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collections_have_stable_names() {
        let names: Vec<_> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["datasets", "series", "categories"]);
    }

    #[test]
    fn record_id_ordering_is_numeric() {
        assert!(RecordId(2) < RecordId(10));
        assert_eq!(RecordId(7).to_string(), "#7");
    }

    #[test]
    fn duplicate_key_message_names_collection() {
        let err = VintageError::DuplicateKey {
            collection: Collection::Series,
            key: "A.B".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate key in series: A.B");
    }
}
