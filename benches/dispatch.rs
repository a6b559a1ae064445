//! Benchmarks for the bandit dispatch path.
//!
//! Run with: cargo bench -- dispatch
//!
//! These benchmarks measure:
//! - Decision overhead per family (choose + finish)
//! - The disabled fast path
//! - Key hashing cost

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kerntune::{CallSiteKey, CostEstimate, Dispatcher, Family, FixedEntryPoint, Implementation};

fn conv_costs() -> Vec<CostEstimate> {
    vec![
        CostEstimate::new(Implementation::Conv2dNative, 10_000.0),
        CostEstimate::new(Implementation::Conv2dMkl, 20_000.0),
    ]
}

/// Full choose + finish cycle for each bandit family.
fn bench_select_finish(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/select_finish");

    for family in [Family::RandomChoice, Family::Gaussian] {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(family);
        let site = FixedEntryPoint::new("bench-site", conv_costs());

        // Warm the store so the steady-state path is measured.
        let mut warm = dispatcher.select(site.clone());
        warm.finish();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{family}")),
            &family,
            |b, _| {
                b.iter(|| {
                    let mut handle = dispatcher.select(black_box(site.clone()));
                    black_box(handle.choice());
                    handle.finish();
                });
            },
        );
    }

    group.finish();
}

/// The disabled path: handle construction with no active family.
fn bench_disabled_path(c: &mut Criterion) {
    let dispatcher = Dispatcher::new();
    let site = FixedEntryPoint::new("bench-site", conv_costs());

    c.bench_function("dispatch/disabled", |b| {
        b.iter(|| {
            let mut handle = dispatcher.select(black_box(site.clone()));
            black_box(handle.choice());
            handle.finish();
        });
    });
}

/// Call-site key construction from shape parameters.
fn bench_key_hashing(c: &mut Criterion) {
    c.bench_function("dispatch/key_from_parts", |b| {
        b.iter(|| {
            black_box(CallSiteKey::from_parts(
                black_box("conv2d"),
                black_box(&[8, 3, 64, 3, 1, 1]),
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_select_finish,
    bench_disabled_path,
    bench_key_hashing
);
criterion_main!(benches);
