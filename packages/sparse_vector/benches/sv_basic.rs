//! Basic benchmarks for the `sparse_vector` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use criterion::{Criterion, criterion_group, criterion_main};
use sparse_vector::SparseVector;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;

fn populated(count: usize) -> SparseVector<TestItem> {
    let mut vector = SparseVector::new();

    for _ in 0..count {
        _ = vector.push_free(TEST_VALUE);
    }

    vector
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("sv_basic");

    group.bench_function("build_empty", |b| {
        b.iter(|| drop(black_box(SparseVector::<TestItem>::new())));
    });

    group.bench_function("push_first", |b| {
        b.iter_custom(|iters| {
            let mut vectors = iter::repeat_with(SparseVector::<TestItem>::new)
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let start = Instant::now();

            for vector in &mut vectors {
                _ = black_box(vector.push_free(black_box(TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    group.bench_function("push_into_reused_cell", |b| {
        b.iter_custom(|iters| {
            let mut vector = populated(1000);

            let start = Instant::now();

            for _ in 0..iters {
                vector.erase_at(black_box(500)).unwrap();
                _ = black_box(vector.push_free(black_box(TEST_VALUE)));
            }

            start.elapsed()
        });
    });

    group.bench_function("read_one", |b| {
        let mut vector = SparseVector::<TestItem>::new();
        let index = vector.push_free(TEST_VALUE);

        b.iter(|| black_box(vector.at(black_box(index))).is_ok());
    });

    group.bench_function("exist_at", |b| {
        let vector = populated(10_000);

        b.iter(|| black_box(vector.exist_at(black_box(5_000))));
    });

    group.finish();

    let mut group = c.benchmark_group("sv_slow");

    group.bench_function("push_10k", |b| {
        b.iter(|| drop(black_box(populated(10_000))));
    });

    group.bench_function("iterate_10k_half_vacant", |b| {
        let mut vector = populated(10_000);

        for index in (0..10_000).step_by(2) {
            vector.erase_at(index).unwrap();
        }

        b.iter(|| black_box(vector.iter().sum::<TestItem>()));
    });

    group.bench_function("fill_10k_free_cells", |b| {
        b.iter_custom(|iters| {
            let mut vectors = iter::repeat_with(|| {
                let mut vector = SparseVector::<TestItem>::new();
                vector.resize(10_000);
                vector
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let start = Instant::now();

            for vector in &mut vectors {
                vector.fill_free_cells(|| TEST_VALUE);
            }

            start.elapsed()
        });
    });

    group.finish();
}
