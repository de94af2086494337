//! # Drift Detection
//!
//! Field-by-field comparison of a stored record against a candidate.
//!
//! Drift is an observability signal, never an error: every differing
//! non-volatile field produces exactly one `Drift` event, handed to a
//! `DriftSink`. The default sink writes a `tracing` warning.

use crate::record::{Record, project};
use crate::VintageError;
use serde::Serialize;
use std::fmt;

/// One detected difference between a stored and a candidate field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    /// Qualified collection label, `namespace.collection`.
    pub collection: String,
    /// Wire name of the differing field.
    pub field: &'static str,
    /// Stored value.
    pub old: serde_json::Value,
    /// Candidate value.
    pub new: serde_json::Value,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} has changed value. Old value: {}, new value: {}",
            self.collection, self.field, self.old, self.new
        )
    }
}

/// Compare `stored` and `candidate` on every schema field except the volatile one.
///
/// Events come out in schema field order. Pure: nothing is emitted.
pub fn detect<R: Record>(
    collection: &str,
    stored: &R,
    candidate: &R,
) -> Result<Vec<Drift>, VintageError> {
    let mut old = project(stored)?;
    let mut new = project(candidate)?;

    let mut drift = Vec::new();
    for field in R::SCHEMA.compared_fields() {
        let old_value = old.remove(field).unwrap_or_default();
        let new_value = new.remove(field).unwrap_or_default();
        if old_value != new_value {
            drift.push(Drift {
                collection: collection.to_string(),
                field,
                old: old_value,
                new: new_value,
            });
        }
    }
    Ok(drift)
}

// =============================================================================
// SINKS
// =============================================================================

/// Receiver of drift events.
pub trait DriftSink {
    /// Record one drift event.
    fn record(&mut self, drift: &Drift);
}

/// Writes every drift event as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DriftSink for TracingSink {
    fn record(&mut self, drift: &Drift) {
        tracing::warn!(
            collection = %drift.collection,
            field = drift.field,
            old = %drift.old,
            new = %drift.new,
            "{} has changed value",
            drift.field
        );
    }
}

/// Keeps every drift event in memory, in emission order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<Drift>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[Drift] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<Drift> {
        std::mem::take(&mut self.events)
    }
}

impl DriftSink for RecordingSink {
    fn record(&mut self, drift: &Drift) {
        self.events.push(drift.clone());
    }
}

impl<S: DriftSink + ?Sized> DriftSink for &mut S {
    fn record(&mut self, drift: &Drift) {
        (**self).record(drift);
    }
}
