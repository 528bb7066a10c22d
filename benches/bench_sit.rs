use criterion::{criterion_group, criterion_main, Criterion};
use interval_indexes::{Interval, IntervalCollection, StaticIntervalTree};
use rand::{thread_rng, Rng};
use std::rc::Rc;

fn random_batch(n: usize) -> Vec<std::rc::Rc<Interval<i64>>> {
    let mut rng = thread_rng();
    (0..n)
        .map(|_| {
            let low = rng.gen_range(0..1_000_000);
            let high = low + rng.gen_range(1..1_000);
            Rc::new(Interval::closed(low, high))
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("sit build n=10000", |b| {
        b.iter_batched(
            || random_batch(10_000),
            |batch| StaticIntervalTree::build(batch, 42),
            criterion::BatchSize::LargeInput,
        )
    });

    c.bench_function("sit find_overlaps on n=10000", |b| {
        let tree = StaticIntervalTree::build(random_batch(10_000), 42);
        let mut rng = thread_rng();

        b.iter(|| {
            let point = rng.gen_range(0..1_000_000);
            tree.count_overlaps(&Interval::point(point))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
