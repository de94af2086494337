//! # Property-Based Tests
//!
//! Reconciliation invariants checked with proptest over generated
//! observation sequences.

use chrono::{Duration, TimeZone, Utc};
use proptest::collection::vec;
use proptest::prelude::*;
use vintage_core::{
    Collection, MemoryStore, Outcome, Reconciler, ReconcilerConfig, RecordStore, RecordingSink,
    ReleaseDate, Series, SeriesBuilder, TypedStore, merge_series,
};

fn release(day: i64) -> ReleaseDate {
    let epoch = Utc
        .with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
        .single()
        .expect("valid epoch");
    epoch + Duration::days(day)
}

fn series(key: &str, start: i64, values: &[Option<u8>], day: i64) -> Series {
    SeriesBuilder::new(key, "Generated", "GEN", "A")
        .start_date(start)
        .values(values.iter().map(|v| v.map(|v| v.to_string())))
        .release_date(release(day))
        .build()
        .expect("valid series")
}

fn engine() -> Reconciler<MemoryStore, RecordingSink> {
    Reconciler::with_sink(
        MemoryStore::new(),
        ReconcilerConfig::default(),
        RecordingSink::new(),
    )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Any sequence of upserts leaves one record per distinct key.
    #[test]
    fn one_record_per_key(keys in vec(0u8..8, 1..40)) {
        let mut engine = engine();
        for (day, key) in keys.iter().enumerate() {
            engine
                .upsert_series(series(&format!("S{key}"), 0, &[Some(*key)], day as i64))
                .expect("upsert");
        }

        let distinct: std::collections::BTreeSet<_> = keys.iter().collect();
        prop_assert_eq!(
            engine.store().count(Collection::Series).expect("count"),
            distinct.len()
        );
    }

    /// Reconciling the stored record against itself never writes.
    #[test]
    fn reupsert_is_idempotent(
        first in vec(proptest::option::of(0u8..5), 1..12),
        second in vec(proptest::option::of(0u8..5), 1..12),
        offset in -4i64..4,
    ) {
        let mut engine = engine();
        engine.upsert_series(series("K", 0, &first, 1)).expect("insert");
        engine.upsert_series(series("K", offset, &second, 2)).expect("upsert");

        let stored = engine
            .store()
            .find_record::<Series>("K")
            .expect("find")
            .expect("present")
            .record;
        let before = engine.store().clone();
        let report = engine.reconcile_series(stored).expect("reconcile");

        prop_assert_eq!(report.outcome, Outcome::Unchanged);
        prop_assert!(report.drift.is_empty());
        prop_assert_eq!(engine.store(), &before);
    }

    /// Sending the same candidate twice reports nothing the second time.
    #[test]
    fn repeated_candidate_has_no_drift(
        first in vec(proptest::option::of(0u8..5), 1..12),
        second in vec(proptest::option::of(0u8..5), 1..12),
        offset in -4i64..4,
    ) {
        let mut engine = engine();
        engine.upsert_series(series("K", 0, &first, 1)).expect("insert");
        engine.upsert_series(series("K", offset, &second, 2)).expect("upsert");

        let before = engine.store().clone();
        let report = engine
            .reconcile_series(series("K", offset, &second, 2))
            .expect("reconcile");

        prop_assert_eq!(report.outcome, Outcome::Unchanged);
        prop_assert!(report.drift.is_empty());
        prop_assert_eq!(engine.store(), &before);
    }

    /// Merging never loses a value: every stored value is either still
    /// current or recorded as a revision.
    #[test]
    fn merge_keeps_every_value(
        first in vec(proptest::option::of(0u8..5), 1..12),
        second in vec(proptest::option::of(0u8..5), 1..12),
        offset in -4i64..4,
    ) {
        let stored = series("K", 0, &first, 1);
        let candidate = series("K", offset, &second, 2);
        let merged = merge_series(&stored, candidate).expect("merge");

        for observation in stored.observations() {
            let Some(value) = observation.value else { continue };
            let kept = merged.observation(observation.period).expect("period covered");
            prop_assert!(
                kept.value == Some(value) || kept.revisions.values().any(|v| v == value)
            );
        }
    }

    /// Unchanged values always keep the release date they were first seen at.
    #[test]
    fn unchanged_values_keep_release_date(values in vec(0u8..5, 1..12), day in 2i64..400) {
        let present: Vec<_> = values.iter().copied().map(Some).collect();
        let stored = series("K", 0, &present, 1);
        let merged = merge_series(&stored, series("K", 0, &present, day)).expect("merge");

        prop_assert!(merged.release_dates().iter().all(|d| *d == Some(release(1))));
    }
}
