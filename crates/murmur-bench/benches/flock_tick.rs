//! Criterion benchmarks for the flocking pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use murmur_bench::flock_profile;

fn bench_flock_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("flock_step");
    for n in [64, 256, 1024] {
        let mut sim = flock_profile(n, 42).unwrap();

        // Warm up: the first tick builds every neighbor list.
        sim.step().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let metrics = sim.step().unwrap();
                black_box(&metrics);
            });
        });
    }
    group.finish();
}

fn bench_act_only(c: &mut Criterion) {
    let mut sim = flock_profile(256, 42).unwrap();
    sim.step().unwrap();

    c.bench_function("flock_act_256", |b| {
        b.iter(|| {
            let summary = sim.act().unwrap();
            sim.discard_staged();
            black_box(summary);
        });
    });
}

fn bench_copy_agent(c: &mut Criterion) {
    c.bench_function("copy_agent_64", |b| {
        b.iter(|| {
            let mut sim = flock_profile(1, 42).unwrap();
            let template = sim.agent_id("boid-0").unwrap();
            for i in 0..64 {
                sim.copy_agent(template, &format!("copy-{i}")).unwrap();
            }
            black_box(sim.len());
        });
    });
}

criterion_group!(benches, bench_flock_step, bench_act_only, bench_copy_agent);
criterion_main!(benches);
