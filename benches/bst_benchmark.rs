use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;

use lockstep::collections::ExternalBst;

fn bench_bst(c: &mut Criterion) {
    let mut group = c.benchmark_group("external_bst");

    group.bench_function("single_thread_mixed_ops", |b| {
        let set = ExternalBst::new();
        for key in (0..10_000).step_by(2) {
            set.insert(key);
        }
        let mut rng = rand::thread_rng();
        b.iter(|| {
            let key: i64 = rng.gen_range(0..10_000);
            match key % 10 {
                0 | 1 => set.insert(key),
                2 | 3 => set.remove(&key),
                _ => {
                    black_box(set.contains(&key));
                }
            }
        });
    });

    group.bench_function("four_thread_contains_heavy_4k_ops", |b| {
        let set = ExternalBst::new();
        for key in (0..10_000).step_by(2) {
            set.insert(key);
        }
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..4 {
                    let set = &set;
                    s.spawn(move || {
                        let mut rng = rand::thread_rng();
                        for _ in 0..1_000 {
                            let key: i64 = rng.gen_range(0..10_000);
                            match key % 10 {
                                0 => set.insert(key),
                                1 => set.remove(&key),
                                _ => {
                                    black_box(set.contains(&key));
                                }
                            }
                        }
                    });
                }
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_bst);
criterion_main!(benches);
