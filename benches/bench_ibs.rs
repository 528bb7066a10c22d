use criterion::{criterion_group, criterion_main, Criterion};
use interval_indexes::{Interval, IntervalBinarySearchTree, IntervalCollection};
use rand::{thread_rng, Rng};
use std::rc::Rc;

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("ibs insert n=10000", |b| {
        let mut tree = IntervalBinarySearchTree::new();
        let mut rng = thread_rng();

        b.iter(|| {
            let low = rng.gen_range(0..1_000_000);
            let high = low + rng.gen_range(1..1_000);
            tree.add(Rc::new(Interval::closed(low, high))).expect("add should work");
        })
    });

    c.bench_function("ibs find_overlaps on n=10000", |b| {
        let mut tree = IntervalBinarySearchTree::new();
        let mut rng = thread_rng();
        for _ in 0..10_000 {
            let low = rng.gen_range(0..1_000_000);
            let high = low + rng.gen_range(1..1_000);
            tree.add(Rc::new(Interval::closed(low, high))).unwrap();
        }

        b.iter(|| {
            let point = rng.gen_range(0..1_000_000);
            tree.count_overlaps(&Interval::point(point))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
