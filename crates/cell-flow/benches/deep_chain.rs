//! Benchmark: revalidation cost of deep memo chains.
//!
//! Every iteration bumps the clock through an unrelated signal, forcing the
//! verifier to walk the whole chain without recomputing anything. This is
//! the engine's steady-state cost for a cache that is still valid.

use std::hint::black_box;

use cell_flow::{Memo, Runtime, Signal};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn build_chain(runtime: &Runtime, depth: usize) -> Memo<u64> {
    let base = Signal::new(runtime, 0u64);
    let mut head = {
        let base = base.clone();
        Memo::new(runtime, move || base.get())
    };
    head.get();
    for _ in 0..depth {
        let prev = head.clone();
        head = Memo::new(runtime, move || prev.get().wrapping_add(1));
        head.get();
    }
    head
}

fn bench_revalidation(c: &mut Criterion) {
    let mut group = c.benchmark_group("revalidate_chain");
    for depth in [16usize, 64, 256, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let runtime = Runtime::new();
            let head = build_chain(&runtime, depth);
            let tick = Signal::new(&runtime, 0u64);
            let mut n = 0u64;
            b.iter(|| {
                n = n.wrapping_add(1);
                tick.set(n);
                black_box(head.get())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_revalidation);
criterion_main!(benches);
