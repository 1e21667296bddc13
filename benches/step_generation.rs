//! Benchmarks for grid generation and queue throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use ringscan::domain::models::Coordinate;
use ringscan::services::{HexGrid, WorkQueue};

fn benchmark_grid_generation(c: &mut Criterion) {
    let origin = Coordinate::new(40.7128, -74.0060);
    let grid = HexGrid::default();

    let mut group = c.benchmark_group("grid_generation");
    for step_limit in [3u32, 12, 50] {
        group.throughput(Throughput::Elements(
            ringscan::services::total_steps(step_limit) as u64,
        ));
        group.bench_with_input(
            BenchmarkId::from_parameter(step_limit),
            &step_limit,
            |b, &limit| b.iter(|| grid.steps(black_box(origin), limit).count()),
        );
    }
    group.finish();
}

fn benchmark_queue_round_trip(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let steps: Vec<_> = HexGrid::default()
        .steps(Coordinate::new(0.0, 0.0), 12)
        .collect();

    c.bench_function("queue_put_get_join_397", |b| {
        b.to_async(&runtime).iter(|| {
            let steps = steps.clone();
            async move {
                let queue = Arc::new(WorkQueue::new());
                for step in steps {
                    queue.put(step);
                }
                while let Some(step) = queue.try_get() {
                    black_box(step);
                    queue.mark_done().unwrap();
                }
                queue.join().await;
            }
        });
    });
}

criterion_group!(benches, benchmark_grid_generation, benchmark_queue_round_trip);
criterion_main!(benches);
