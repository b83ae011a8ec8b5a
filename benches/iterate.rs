use criterion::*;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for &(label, n) in &[("view_10k", AGENTS_SMALL), ("view_100k", AGENTS_MED)] {
        let registry = make_world(n);
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for view in registry.view::<(Position, Velocity)>() {
                    let (position, velocity) = view.components;
                    sum += position.x * velocity.dx;
                }
                black_box(sum);
            });
        });
    }

    let registry = make_world(AGENTS_MED);
    group.bench_function("par_for_each_100k", |b| {
        b.iter(|| {
            let sum = AtomicU64::new(0);
            registry.par_for_each::<(Position, Wealth)>(|view| {
                let (position, wealth) = view.components;
                sum.fetch_add((position.x + wealth.value) as u64, Ordering::Relaxed);
            });
            black_box(sum.load(Ordering::Relaxed));
        });
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
