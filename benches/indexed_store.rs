//! IndexedStore Benchmarks
//!
//! Covers the two hot paths:
//! - put: atomic record + five index entries
//! - resolve: direct, two-hop unique, and paginated list lookups
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench indexed_store
//! cargo bench --bench indexed_store -- "resolve/list"
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sidx::{Context, IndexedStore, Record, RetryConfig};
use std::sync::atomic::{AtomicI64, Ordering};

// =============================================================================
// Constants and Configuration
// =============================================================================

/// Fixed seed for deterministic "random" key selection.
const BENCH_SEED: u64 = 0xDEADBEEF_CAFEBABE;

/// Records preloaded before resolve benchmarks.
const PRELOAD: i64 = 10_000;

/// Distinct `Mode` values; list length is PRELOAD / MODES.
const MODES: i64 = 10;

// =============================================================================
// Helper Functions
// =============================================================================

fn make_record(n: i64) -> Record {
    Record {
        global_id: n,
        system_object_id: format!("obj-{}", n),
        id: n,
        id_en: n,
        name: format!("Parking {}", n),
        address: format!("{} Tverskaya St", n),
        car_capacity: n % 300,
        mode: format!("mode-{}", n % MODES),
        mode_en: format!("mode-en-{}", n % MODES),
        ..Default::default()
    }
}

/// Simple LCG for deterministic "random" key selection.
#[inline]
fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn preloaded_store() -> IndexedStore<sidx::MemoryEngine> {
    let store = IndexedStore::in_memory(RetryConfig::default());
    let ctx = Context::background();
    for n in 0..PRELOAD {
        store.put(&ctx, &make_record(n)).unwrap();
    }
    store
}

// =============================================================================
// Put
// =============================================================================

fn put_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    // Fresh keys every iteration, shared list keys
    {
        let store = IndexedStore::in_memory(RetryConfig::default());
        let ctx = Context::background();
        let counter = AtomicI64::new(0);

        group.bench_function("unique_keys", |b| {
            b.iter(|| {
                let n = counter.fetch_add(1, Ordering::Relaxed);
                store.put(&ctx, black_box(&make_record(n))).unwrap()
            });
        });
    }

    // Same record rewritten; list keys keep growing
    {
        let store = IndexedStore::in_memory(RetryConfig::default());
        let ctx = Context::background();
        let record = make_record(1);

        group.bench_function("overwrite", |b| {
            b.iter(|| store.put(&ctx, black_box(&record)).unwrap());
        });
    }

    group.finish();
}

// =============================================================================
// Resolve
// =============================================================================

fn resolve_benchmarks(c: &mut Criterion) {
    let store = preloaded_store();
    let ctx = Context::background();

    let mut group = c.benchmark_group("resolve/unique");
    group.throughput(Throughput::Elements(1));

    let mut rng_state = BENCH_SEED;
    group.bench_function("primary_key", |b| {
        b.iter(|| {
            let n = (lcg_next(&mut rng_state) % PRELOAD as u64) as i64;
            let key = format!("obj-{}", n);
            black_box(store.resolve(&ctx, &key, false, 0, 0).unwrap())
        });
    });

    let mut rng_state = BENCH_SEED;
    group.bench_function("two_hop", |b| {
        b.iter(|| {
            let n = (lcg_next(&mut rng_state) % PRELOAD as u64) as i64;
            let key = format!("global_id:{}", n);
            black_box(store.resolve(&ctx, &key, false, 0, 0).unwrap())
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| black_box(store.resolve(&ctx, "global_id:-1", false, 0, 0).unwrap()));
    });
    group.finish();

    let mut group = c.benchmark_group("resolve/list");
    for page_size in [0_i64, 5, 50, 500] {
        group.throughput(Throughput::Elements(page_size as u64 + 1));
        group.bench_with_input(
            BenchmarkId::from_parameter(page_size),
            &page_size,
            |b, &page_size| {
                b.iter(|| {
                    black_box(
                        store
                            .resolve(&ctx, "mode:mode-3", true, page_size, 0)
                            .unwrap(),
                    )
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, put_benchmarks, resolve_benchmarks);
criterion_main!(benches);
