// Allocator Benchmarks (Criterion)
//
// Measures the hot paths of a configuration screen:
// - headroom computation for add and edit dialogs
// - commit-time validation (accepted and rejected proposals)
// - record conversion at the persistence boundary
//
// Usage:
//   cargo bench --bench allocator
//
// Results are saved to target/criterion/.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use engagement_quota::quota::{
    allocator, Allocation, Budget, Configuration, ConfigurationRecord, Consumer, ConsumerRef,
    Target, TargetId,
};
use std::hint::black_box;

/// Configuration with `targets` one-like-one-comment targets
fn configuration(targets: usize) -> Configuration {
    let budget = Budget::new(targets as u32 + 10, targets as u32 + 10);
    let targets = (0..targets)
        .map(|i| Target::new(TargetId::generate(), format!("#k{}", i), Allocation::new(1, 1)))
        .collect();
    Configuration::new(budget, Allocation::new(5, 5), targets).unwrap()
}

fn bench_effective_max(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_effective_max");

    for n in [1usize, 3, 20].iter() {
        let config = configuration(*n);
        let edited = ConsumerRef::from(config.targets()[0].id);

        group.bench_with_input(BenchmarkId::new("new", n), &config, |b, config| {
            b.iter(|| black_box(allocator::compute_effective_max(config, None)));
        });
        group.bench_with_input(BenchmarkId::new("edit", n), &config, |b, config| {
            b.iter(|| black_box(allocator::compute_effective_max(config, Some(edited))));
        });
    }

    group.finish();
}

fn bench_propose_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("propose_upsert");
    let config = configuration(3);

    group.bench_function("accepted", |b| {
        b.iter(|| {
            let target = Target::new(TargetId::generate(), "#new", Allocation::new(2, 2));
            black_box(allocator::propose_upsert(&config, Consumer::Target(target)).is_ok())
        });
    });

    group.bench_function("rejected", |b| {
        b.iter(|| {
            let target = Target::new(TargetId::generate(), "#new", Allocation::new(99, 0));
            black_box(allocator::propose_upsert(&config, Consumer::Target(target)).is_err())
        });
    });

    group.finish();
}

fn bench_record_conversion(c: &mut Criterion) {
    let config = configuration(3);
    let json = serde_json::to_string(&ConfigurationRecord::from(&config)).unwrap();

    c.bench_function("record_parse_and_convert", |b| {
        b.iter(|| {
            let record: ConfigurationRecord = serde_json::from_str(black_box(&json)).unwrap();
            black_box(record.into_configuration(Budget::default()).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_effective_max,
    bench_propose_upsert,
    bench_record_conversion
);

criterion_main!(benches);
