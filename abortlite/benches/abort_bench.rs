//! Benchmarks for abort dispatch and combinator wiring.

use abortlite::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn abort_benchmark(c: &mut Criterion) {
    c.bench_function("controller_abort", |b| {
        b.iter(|| {
            let controller = AbortController::new();
            controller.abort();
            black_box(controller.signal().is_aborted())
        })
    });

    c.bench_function("any_wiring_and_cascade", |b| {
        b.iter(|| {
            let controllers: Vec<AbortController> =
                (0..8).map(|_| AbortController::new()).collect();
            let derived = AbortSignal::any(controllers.iter().map(|c| c.signal().clone()));
            controllers[0].abort();
            black_box(derived.is_aborted())
        })
    });
}

criterion_group!(benches, abort_benchmark);
criterion_main!(benches);
