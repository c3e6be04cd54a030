//! # Loaded Filter Benchmarks
//!
//! | Operation | Expectation |
//! |-----------|-------------|
//! | Build one filter | Linear in beneficiaries |
//! | `is_result_set_empty` | Linear in filters, short-circuits on old loads |
//! | `might_contain` | Constant, k hash probes |

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use loaded_filters::domain::build_filter;
use loaded_filters::{
    DateRange, InMemoryBatchStore, LoadedBatch, LoadedFilterApi, LoadedFilterManager, Timestamp,
};

fn at(minutes: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

fn random_batches(batches: usize, per_batch: usize) -> Vec<LoadedBatch> {
    let mut rng = rand::thread_rng();
    (0..batches)
        .map(|b| {
            let ids: Vec<String> = (0..per_batch)
                .map(|_| format!("-{:015}", rng.gen_range(0..10_000_000_000u64)))
                .collect();
            LoadedBatch::new(b as u64, 1, &ids, at(b as i64))
        })
        .collect()
}

// ============================================================================
// Filter construction
// ============================================================================

fn bench_build_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("build-filter");
    group.measurement_time(Duration::from_secs(10));

    for batches in [1, 10, 50] {
        let input = random_batches(batches, 1_000);
        group.throughput(Throughput::Elements((batches * 1_000) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batches), &input, |b, input| {
            b.iter(|| {
                let filter = build_filter(1, at(0), &mut |_| Ok(input.clone())).unwrap();
                black_box(filter.bit_size())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Result-set queries
// ============================================================================

fn bench_result_set_empty(c: &mut Criterion) {
    let mut group = c.benchmark_group("is-result-set-empty");

    for files in [10usize, 100, 500] {
        let store = Arc::new(InMemoryBatchStore::new());
        let manager = LoadedFilterManager::new(store);
        let filters = (0..files)
            .map(|i| {
                let batches = random_batches(1, 200);
                let filter = build_filter(i as u64, at(i as i64 * 10), &mut |_| Ok(batches.clone()))
                    .unwrap();
                Arc::new(filter)
            })
            .collect();
        manager.set(filters, at(0), at(files as i64 * 10));

        let everything = DateRange::starting_at(at(0));
        let recent = DateRange::starting_at(at(files as i64 * 10 - 50));

        group.bench_with_input(BenchmarkId::new("full-scan", files), &everything, |b, range| {
            b.iter(|| black_box(manager.is_result_set_empty("absent", range).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("short-circuit", files), &recent, |b, range| {
            b.iter(|| black_box(manager.is_result_set_empty("absent", range).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_filter, bench_result_set_empty);
criterion_main!(benches);
