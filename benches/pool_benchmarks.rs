use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fastpool::{build, Config, OneWayPool, Pool, PoolKind, StealingPool};
use std::{hint::black_box, thread, time::Duration};

const KINDS: [PoolKind; 3] = [PoolKind::Unsorted, PoolKind::Ordered, PoolKind::Stealing];

// Benchmark 1: накладные расходы на элемент при тривиальном воркере
fn bench_trivial_items(c: &mut Criterion) {
    let mut group = c.benchmark_group("trivial_items");
    group.sample_size(20);

    for size in [1_000u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size));

        for kind in KINDS {
            group.bench_with_input(
                BenchmarkId::new(format!("{kind:?}"), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        let mut pool = build(
                            kind,
                            Config::default().with_threads(8),
                            |i: u64| i + 1,
                            |i| {
                                black_box(i);
                            },
                        )
                        .unwrap();
                        for i in 0..size {
                            pool.add(i).unwrap();
                        }
                        black_box(pool.join());
                    });
                },
            );
        }

        group.bench_with_input(BenchmarkId::new("OneWay", size), &size, |b, &size| {
            b.iter(|| {
                let mut pool = OneWayPool::new(8, |i: u64| {
                    black_box(i + 1);
                })
                .unwrap();
                for i in 0..size {
                    pool.add(i).unwrap();
                }
                black_box(pool.join());
            });
        });
    }

    group.finish();
}

// Benchmark 2: влияние вместимости очереди
fn bench_queue_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_capacity");
    group.sample_size(20);
    let items = 20_000u64;
    group.throughput(Throughput::Elements(items));

    for capacity in [8usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("ordered", capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut pool = build(
                    PoolKind::Ordered,
                    Config::default().with_threads(4).with_capacity(capacity),
                    |i: u64| i.wrapping_mul(31),
                    |i| {
                        black_box(i);
                    },
                )
                .unwrap();
                for i in 0..items {
                    pool.add(i).unwrap();
                }
                black_box(pool.join());
            });
        });
    }

    group.finish();
}

// Benchmark 3: перекос нагрузки, кража работы включена/выключена
fn bench_work_stealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("work_stealing_skew");
    group.sample_size(10);

    for enable_work_stealing in [false, true] {
        group.bench_function(format!("stealing_{enable_work_stealing}"), |b| {
            b.iter(|| {
                let config = Config {
                    num_threads: 4,
                    enable_work_stealing,
                    ..Default::default()
                };
                let mut pool = StealingPool::with_config(
                    config,
                    |i: u64| {
                        let cost = if i % 4 == 0 { 500 } else { 50 };
                        thread::sleep(Duration::from_micros(cost));
                        i
                    },
                    |i| {
                        black_box(i);
                    },
                )
                .unwrap();
                for i in 0..400 {
                    pool.add(i).unwrap();
                }
                black_box(pool.join());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_trivial_items, bench_queue_capacity, bench_work_stealing);

criterion_main!(benches);
