use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use divvy_coordinator::server::allocator::IntervalAllocator;
use std::{sync::Arc, thread::scope};

// Allocations per benchmark iteration (per-thread for multi-threaded).
const TOTAL_ALLOCATIONS: usize = 4096;

fn bench_allocator(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator");
    group.throughput(Throughput::Elements(TOTAL_ALLOCATIONS as u64));

    // A wide draw range keeps retry collisions out of the measurement.
    group.bench_function("sequential", |b| {
        b.iter_batched(
            || IntervalAllocator::new(u64::MAX - 1),
            |allocator| {
                for _ in 0..TOTAL_ALLOCATIONS {
                    black_box(allocator.allocate());
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("contended_8_threads", |b| {
        b.iter_batched(
            || Arc::new(IntervalAllocator::new(u64::MAX - 1)),
            |allocator| {
                scope(|s| {
                    for _ in 0..8 {
                        let allocator = Arc::clone(&allocator);
                        s.spawn(move || {
                            for _ in 0..TOTAL_ALLOCATIONS {
                                black_box(allocator.allocate());
                            }
                        });
                    }
                });
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_allocator);
criterion_main!(benches);
