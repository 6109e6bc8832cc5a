//! Single-threaded throughput benchmarks, modeled on the teacher's
//! `std_hashmap_bench.rs`: fill, lookup, and incremental-rehash cost
//! against `std::collections::HashSet` as a baseline.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hashset::HashSet;

const ITER: u64 = 32 * 1024;

fn task_fill_hashset() -> HashSet<u64> {
    let mut set = HashSet::with_capacity(ITER as usize);
    for i in 0..ITER {
        set.add(i).unwrap();
    }
    set
}

fn task_fill_std() -> std::collections::HashSet<u64> {
    let mut set = std::collections::HashSet::with_capacity(ITER as usize);
    for i in 0..ITER {
        set.insert(i);
    }
    set
}

fn fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("HashSet/fill");
    group.throughput(Throughput::Elements(ITER));
    group.bench_function("hashset", |bencher| bencher.iter(task_fill_hashset));
    group.bench_function("std", |bencher| bencher.iter(task_fill_std));
    group.finish();
}

fn lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("HashSet/lookup_all");
    group.throughput(Throughput::Elements(ITER));

    let set = task_fill_hashset();
    group.bench_function("hashset", |bencher| {
        bencher.iter(|| {
            for i in 0..ITER {
                assert!(set.contains(&i));
            }
        })
    });

    let std_set = task_fill_std();
    group.bench_function("std", |bencher| {
        bencher.iter(|| {
            for i in 0..ITER {
                assert!(std_set.contains(&i));
            }
        })
    });
    group.finish();
}

fn fill_then_drain_with_rehash(c: &mut Criterion) {
    let mut group = c.benchmark_group("HashSet/fill_then_delete_all");
    group.throughput(Throughput::Elements(ITER));
    group.bench_function("hashset", |bencher| {
        bencher.iter(|| {
            let mut set = task_fill_hashset();
            for i in 0..ITER {
                set.delete(&i);
            }
            set
        })
    });
    group.finish();
}

criterion_group!(benches, fill, lookup, fill_then_drain_with_rehash);
criterion_main!(benches);
