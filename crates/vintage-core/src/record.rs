//! # Record Trait
//!
//! The common surface of every reconcilable record kind, plus the codecs the
//! stores and the drift detector rely on:
//! - `encode` / `decode`: postcard bytes as kept by the stores
//! - `project`: the JSON field map compared during drift detection

use crate::VintageError;
use crate::primitives::MAX_FIELD_LENGTH;
use crate::schema::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

/// A record that can be stored and reconciled by natural key.
///
/// Implementors validate their invariants at construction, so any value of
/// an implementing type is well formed.
pub trait Record: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug {
    /// Static shape of this record kind.
    const SCHEMA: Schema;

    /// Value of the natural key field.
    fn natural_key(&self) -> &str;
}

/// Encode a record for storage.
pub fn encode<R: Record>(record: &R) -> Result<Vec<u8>, VintageError> {
    postcard::to_allocvec(record).map_err(|e| VintageError::Serialization(e.to_string()))
}

/// Decode a stored record.
///
/// Decoding re-runs the constructor checks, so a corrupted payload surfaces
/// as a `Deserialization` error instead of an invalid record.
pub fn decode<R: Record>(bytes: &[u8]) -> Result<R, VintageError> {
    postcard::from_bytes(bytes).map_err(|e| VintageError::Deserialization(e.to_string()))
}

/// Project a record onto its schema fields as JSON values.
///
/// Fields the record does not serialize project to `Null`.
pub fn project<R: Record>(
    record: &R,
) -> Result<BTreeMap<&'static str, serde_json::Value>, VintageError> {
    let value =
        serde_json::to_value(record).map_err(|e| VintageError::Serialization(e.to_string()))?;
    let serde_json::Value::Object(mut object) = value else {
        return Err(VintageError::Serialization(format!(
            "{} record did not serialize to an object",
            R::SCHEMA.collection
        )));
    };

    Ok(R::SCHEMA
        .fields
        .iter()
        .map(|&field| {
            let value = object.remove(field).unwrap_or(serde_json::Value::Null);
            (field, value)
        })
        .collect())
}

/// Validate a required text field: non-empty and within `MAX_FIELD_LENGTH`.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), VintageError> {
    if value.trim().is_empty() {
        return Err(VintageError::invalid(format!("{field} must not be empty")));
    }
    check_length(field, value)
}

/// Validate an optional text field length.
pub(crate) fn check_length(field: &str, value: &str) -> Result<(), VintageError> {
    if value.len() > MAX_FIELD_LENGTH {
        return Err(VintageError::invalid(format!(
            "{field} exceeds {MAX_FIELD_LENGTH} bytes"
        )));
    }
    Ok(())
}
