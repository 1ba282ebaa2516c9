use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use lockstep::sort::{sort_sequential, ParallelSorter};
use lockstep::testing::generate_array;

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("quicksort");
    let input: Vec<i32> = generate_array(200_000);

    group.bench_function("sequential_200k", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| {
                sort_sequential(&mut data);
                black_box(data)
            },
            BatchSize::LargeInput,
        );
    });

    for threads in [2, 4] {
        let sorter = ParallelSorter::new(threads);
        group.bench_function(format!("parallel_200k_t{threads}"), |b| {
            b.iter_batched(
                || input.clone(),
                |mut data| {
                    sorter.sort(&mut data);
                    black_box(data)
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort);
criterion_main!(benches);
