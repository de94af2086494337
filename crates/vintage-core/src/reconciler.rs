//! # Reconciler
//!
//! Upserts candidate records into a `RecordStore` by natural key.
//!
//! Every record kind goes through the same Lookup-and-Merge step:
//! 1. Look the candidate's natural key up in its collection.
//! 2. Absent: insert the candidate as is.
//! 3. Present: merge the candidate into the stored record, then compare
//!    every non-volatile field of the stored record and the merge result.
//!    Each differing field yields one `Drift`, handed to the sink.
//! 4. No drift: nothing is written.
//! 5. Drift: overwrite the stored record under its existing identity.
//!
//! Datasets and categories merge by replacement, so their drift is the
//! difference between stored record and candidate. Series merge observation
//! by observation (see [`merge_series`]); their drift covers what the merge
//! actually changes, including the release dates and revisions it rewrites.
//! Sending the same candidate again therefore reports nothing.
//!
//! The reconciler owns its store and every mutation takes `&mut self`, so a
//! single reconciler is the only writer of its store.

use crate::config::ReconcilerConfig;
use crate::drift::{Drift, DriftSink, TracingSink, detect};
use crate::merge::merge_series;
use crate::record::Record;
use crate::store::{RecordStore, TypedStore};
use crate::{Category, Dataset, RecordId, Series, VintageError};
use serde::Serialize;
use std::fmt;

/// What a reconciliation did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// No record had the key; the candidate was inserted.
    Inserted,
    /// The stored record was overwritten in place.
    Updated,
    /// Nothing was written.
    Unchanged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        })
    }
}

/// Report of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Identity of the record holding the candidate's key.
    pub id: RecordId,
    pub outcome: Outcome,
    /// Drift events emitted, in schema field order.
    pub drift: Vec<Drift>,
}

impl Reconciliation {
    const fn new(id: RecordId, outcome: Outcome, drift: Vec<Drift>) -> Self {
        Self { id, outcome, drift }
    }
}

/// Reconciliation engine over a store `S`, reporting drift to `D`.
#[derive(Debug)]
pub struct Reconciler<S, D = TracingSink> {
    store: S,
    sink: D,
    config: ReconcilerConfig,
}

impl<S: RecordStore> Reconciler<S> {
    /// Create a reconciler that logs drift through `tracing`.
    #[must_use]
    pub fn new(store: S, config: ReconcilerConfig) -> Self {
        Self::with_sink(store, config, TracingSink)
    }
}

impl<S: RecordStore, D: DriftSink> Reconciler<S, D> {
    /// Create a reconciler with a custom drift sink.
    #[must_use]
    pub const fn with_sink(store: S, config: ReconcilerConfig, sink: D) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give the store back.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    #[must_use]
    pub const fn sink(&self) -> &D {
        &self.sink
    }

    #[must_use]
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    // =========================================================================
    // UPSERTS
    // =========================================================================

    /// Upsert a dataset and return its identity.
    pub fn upsert_dataset(&mut self, candidate: Dataset) -> Result<RecordId, VintageError> {
        Ok(self.reconcile_dataset(candidate)?.id)
    }

    /// Upsert a series and return its identity.
    pub fn upsert_series(&mut self, candidate: Series) -> Result<RecordId, VintageError> {
        Ok(self.reconcile_series(candidate)?.id)
    }

    /// Upsert a category node and return its identity.
    pub fn upsert_category(&mut self, candidate: Category) -> Result<RecordId, VintageError> {
        Ok(self.reconcile_category(candidate)?.id)
    }

    /// Upsert a dataset; a differing candidate replaces the stored record.
    pub fn reconcile_dataset(&mut self, candidate: Dataset) -> Result<Reconciliation, VintageError> {
        self.lookup_and_merge(candidate, |_, candidate| Ok(candidate))
    }

    /// Upsert a series, merging observations into the stored record.
    pub fn reconcile_series(&mut self, candidate: Series) -> Result<Reconciliation, VintageError> {
        self.lookup_and_merge(candidate, merge_series)
    }

    /// Upsert a category node; a differing candidate replaces the stored node.
    pub fn reconcile_category(
        &mut self,
        candidate: Category,
    ) -> Result<Reconciliation, VintageError> {
        self.lookup_and_merge(candidate, |_, candidate| Ok(candidate))
    }

    // =========================================================================
    // LOOKUP AND MERGE
    // =========================================================================

    fn lookup_and_merge<R: Record>(
        &mut self,
        candidate: R,
        merge: impl FnOnce(&R, R) -> Result<R, VintageError>,
    ) -> Result<Reconciliation, VintageError> {
        let label = self.config.collection_label(R::SCHEMA.collection);

        let Some(stored) = self.store.find_record::<R>(candidate.natural_key())? else {
            let id = self.store.insert_record(&candidate)?;
            tracing::info!(
                collection = %label,
                key = candidate.natural_key(),
                id = %id,
                "record inserted"
            );
            return Ok(Reconciliation::new(id, Outcome::Inserted, Vec::new()));
        };

        let merged = merge(&stored.record, candidate)?;
        let drift = detect(&label, &stored.record, &merged)?;
        if drift.is_empty() {
            tracing::debug!(
                collection = %label,
                key = merged.natural_key(),
                id = %stored.id,
                "no drift, write skipped"
            );
            return Ok(Reconciliation::new(stored.id, Outcome::Unchanged, drift));
        }
        for event in &drift {
            self.sink.record(event);
        }

        self.store.update_record(stored.id, &merged)?;
        tracing::debug!(
            collection = %label,
            key = merged.natural_key(),
            id = %stored.id,
            fields = drift.len(),
            "record updated"
        );
        Ok(Reconciliation::new(stored.id, Outcome::Updated, drift))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::RecordingSink;
    use crate::store::MemoryStore;
    use crate::{Collection, ReleaseDate, SeriesBuilder};
    use chrono::{TimeZone, Utc};

    fn date(day: u32) -> ReleaseDate {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn reconciler() -> Reconciler<MemoryStore, RecordingSink> {
        Reconciler::with_sink(
            MemoryStore::new(),
            ReconcilerConfig::default(),
            RecordingSink::new(),
        )
    }

    fn series(values: &[&str], released: ReleaseDate) -> Series {
        SeriesBuilder::new("GDP.Q.DE", "GDP Germany", "NAAG", "Q")
            .observed(values.iter().copied())
            .release_date(released)
            .build()
            .expect("valid series")
    }

    #[test]
    fn first_upsert_inserts() {
        let mut engine = reconciler();
        let report = engine
            .reconcile_dataset(Dataset::new("NAAG").expect("valid"))
            .expect("reconcile");

        assert_eq!(report.outcome, Outcome::Inserted);
        assert!(report.drift.is_empty());
        assert_eq!(engine.store().count(Collection::Datasets).expect("count"), 1);
    }

    #[test]
    fn identical_candidate_is_unchanged() {
        let mut engine = reconciler();
        let first = engine.upsert_series(series(&["1", "2"], date(1))).expect("insert");
        let report = engine
            .reconcile_series(series(&["1", "2"], date(1)))
            .expect("reconcile");

        assert_eq!(report.id, first);
        assert_eq!(report.outcome, Outcome::Unchanged);
        assert!(engine.sink().events().is_empty());
    }

    #[test]
    fn changed_dataset_is_replaced_in_place() {
        let mut engine = reconciler();
        let stored = Dataset::new("NAAG").expect("valid");
        let id = engine.upsert_dataset(stored.clone()).expect("insert");

        let candidate = stored
            .edited(|draft| draft.name = "National accounts".to_string())
            .expect("valid");
        let report = engine.reconcile_dataset(candidate.clone()).expect("reconcile");

        assert_eq!(report.outcome, Outcome::Updated);
        assert_eq!(report.id, id);
        assert_eq!(report.drift.len(), 1);
        assert_eq!(report.drift[0].field, "name");
        assert_eq!(report.drift[0].collection, "vintage.datasets");

        let found = engine
            .store()
            .find_record::<Dataset>("NAAG")
            .expect("find")
            .expect("present");
        assert_eq!(found.record, candidate);
    }

    #[test]
    fn drift_reaches_the_sink_in_order() {
        let mut engine = reconciler();
        engine.upsert_series(series(&["1", "2"], date(1))).expect("insert");
        let report = engine
            .reconcile_series(series(&["1", "5"], date(2)))
            .expect("reconcile");

        assert_eq!(engine.sink().events(), report.drift.as_slice());
        let fields: Vec<_> = report.drift.iter().map(|d| d.field).collect();
        assert_eq!(fields, ["values", "releaseDates", "revisions"]);
    }

    #[test]
    fn repeated_candidate_drifts_once() {
        let mut engine = reconciler();
        let id = engine
            .upsert_series(series(&["1", "2", "3"], date(1)))
            .expect("insert");

        let first = engine
            .reconcile_series(series(&["1", "2", "9"], date(2)))
            .expect("reconcile");
        assert_eq!(first.outcome, Outcome::Updated);
        let after_first = engine.store().clone();

        let second = engine
            .reconcile_series(series(&["1", "2", "9"], date(2)))
            .expect("reconcile");
        assert_eq!(second.id, id);
        assert_eq!(second.outcome, Outcome::Unchanged);
        assert!(second.drift.is_empty());
        assert_eq!(engine.sink().events(), first.drift.as_slice());
        assert_eq!(engine.store(), &after_first);
    }

    #[test]
    fn trailing_window_resend_is_not_written() {
        let mut engine = reconciler();
        let id = engine
            .upsert_series(series(&["1", "2", "3"], date(1)))
            .expect("insert");

        // Only the last period is resent, unchanged.
        let window = SeriesBuilder::new("GDP.Q.DE", "GDP Germany", "NAAG", "Q")
            .start_date(2)
            .observed(["3"])
            .release_date(date(1))
            .build()
            .expect("valid series");
        let report = engine.reconcile_series(window).expect("reconcile");

        assert_eq!(report.id, id);
        assert_eq!(report.outcome, Outcome::Unchanged);
        assert!(report.drift.is_empty());
        assert!(engine.sink().events().is_empty());

        let found = engine
            .store()
            .find_record::<Series>("GDP.Q.DE")
            .expect("find")
            .expect("present");
        assert_eq!(found.record.len(), 3);
    }

    #[test]
    fn category_without_volatile_field_reconciles() {
        let mut engine = reconciler();
        let node = Category::new("ECO", "Economy").expect("valid");
        let id = engine.upsert_category(node.clone()).expect("insert");

        let renamed = Category::new("ECO", "Economy and finance").expect("valid");
        let report = engine.reconcile_category(renamed).expect("reconcile");
        assert_eq!(report.outcome, Outcome::Updated);
        assert_eq!(report.id, id);

        let hidden = engine
            .reconcile_category(node.with_present(true))
            .expect("reconcile");
        let fields: Vec<_> = hidden.drift.iter().map(|d| d.field).collect();
        assert_eq!(fields, ["name", "present"]);
    }

    #[test]
    fn namespace_prefixes_drift_collection() {
        let config = ReconcilerConfig {
            namespace: "widukind".to_string(),
        };
        let mut engine = Reconciler::with_sink(MemoryStore::new(), config, RecordingSink::new());
        engine.upsert_series(series(&["1"], date(1))).expect("insert");
        engine.upsert_series(series(&["2"], date(2))).expect("update");

        assert!(
            engine
                .sink()
                .events()
                .iter()
                .all(|d| d.collection == "widukind.series")
        );
    }
}
