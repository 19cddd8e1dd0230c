use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sdkwatch::notify::LogNotifier;
use sdkwatch::source::{InstalledPackage, StaticSource};
use sdkwatch::store::SqliteStore;
use sdkwatch::sync::Reconciler;

/// A device inventory of `count` user apps spread over recent API levels
fn inventory(count: usize, sdk_offset: i32) -> Vec<InstalledPackage> {
    (0..count)
        .map(|i| InstalledPackage {
            package_name: format!("com.bench.app{i}"),
            version_code: i as i64,
            version_name: format!("1.{i}"),
            target_sdk: 28 + (i as i32 % 7) + sdk_offset,
            min_sdk: 21,
            last_update_time: 1_700_000_000_000,
            is_user_app: i % 4 != 0,
        })
        .collect()
}

fn reconciler(source: Arc<StaticSource>) -> Reconciler {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    Reconciler::new(source, store, Arc::new(LogNotifier))
}

/// Benchmark: first sync of a fresh device, every app registered
fn bench_first_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_sync");

    for count in [50, 200, 500] {
        group.bench_with_input(BenchmarkId::new("packages", count), &count, |b, &count| {
            b.iter(|| {
                let source = Arc::new(StaticSource::new(inventory(count, 0)));
                let report = reconciler(source).reconcile_all().unwrap();
                black_box(report);
            });
        });
    }

    group.finish();
}

/// Benchmark: steady state pass where nothing changed
fn bench_unchanged_sync(c: &mut Criterion) {
    c.bench_function("unchanged_sync_500", |b| {
        let source = Arc::new(StaticSource::new(inventory(500, 0)));
        let reconciler = reconciler(source);
        reconciler.reconcile_all().unwrap();

        b.iter(|| {
            let report = reconciler.reconcile_all().unwrap();
            black_box(report);
        });
    });
}

/// Benchmark: every app raised its target SDK since the last pass
fn bench_all_changed_sync(c: &mut Criterion) {
    c.bench_function("all_changed_sync_500", |b| {
        b.iter_batched(
            || {
                let source = Arc::new(StaticSource::new(inventory(500, 0)));
                let reconciler = reconciler(source.clone());
                reconciler.reconcile_all().unwrap();
                source.replace(inventory(500, 1));
                reconciler
            },
            |reconciler| black_box(reconciler.reconcile_all().unwrap()),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_first_sync,
    bench_unchanged_sync,
    bench_all_changed_sync,
);

criterion_main!(benches);
