//! # Merge Benchmarks
//!
//! Performance benchmarks for vintage-core reconciliation.
//!
//! Run with: `cargo bench -p vintage-core`

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vintage_core::{
    MemoryStore, Reconciler, ReconcilerConfig, RecordingSink, ReleaseDate, Series, SeriesBuilder,
    merge_series,
};

fn release(day: i64) -> ReleaseDate {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .expect("valid epoch")
        + Duration::days(day)
}

/// A series of `size` periods whose values depend on `vintage`.
///
/// Every tenth period changes between vintages, the rest stay equal.
fn create_series(size: usize, vintage: i64) -> Series {
    SeriesBuilder::new("BENCH.M", "Bench series", "BENCH", "M")
        .observed((0..size).map(|i| {
            if i % 10 == 0 {
                format!("{i}.{vintage}")
            } else {
                i.to_string()
            }
        }))
        .release_date(release(vintage))
        .build()
        .expect("valid series")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_series");

    for size in [100, 1000, 10000].iter() {
        let stored = create_series(*size, 0);
        let candidate = create_series(*size, 1);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(merge_series(&stored, candidate.clone())));
        });
    }

    group.finish();
}

fn bench_vintages(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_vintages");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut engine = Reconciler::with_sink(
                    MemoryStore::new(),
                    ReconcilerConfig::default(),
                    RecordingSink::new(),
                );
                for vintage in 0..10 {
                    let _ = engine.upsert_series(create_series(size, vintage));
                }
                black_box(engine.into_store())
            });
        });
    }

    group.finish();
}

fn bench_unchanged(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_unchanged");

    for size in [100, 1000, 10000].iter() {
        let series = create_series(*size, 0);
        let mut engine = Reconciler::with_sink(
            MemoryStore::new(),
            ReconcilerConfig::default(),
            RecordingSink::new(),
        );
        engine.upsert_series(series.clone()).expect("insert");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(engine.reconcile_series(series.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge, bench_vintages, bench_unchanged);
criterion_main!(benches);
