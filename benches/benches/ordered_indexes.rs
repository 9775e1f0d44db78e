// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use thicket_heap::MinHeap;
use thicket_interval_tree::{Interval, IntervalTree};
use thicket_lru::LruCache;
use thicket_range_tree::RangeTree;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_keys(count: usize) -> Vec<f64> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count).map(|_| rng.next_f64() * 1000.0).collect()
}

fn gen_spans(count: usize) -> Vec<(f64, f64)> {
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| {
            let start = rng.next_f64() * 1000.0;
            (start, start + 5.0 + rng.next_f64() * 45.0)
        })
        .collect()
}

fn query_windows() -> impl Iterator<Item = (f64, f64)> {
    (0..256).map(|q| {
        let from = (q as f64 * 3.9) % 1000.0;
        (from, from + 25.0)
    })
}

fn bench_range_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_tree");
    for &n in &[1024usize, 8192] {
        let keys = gen_keys(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("insert_query_n{}", n), |b| {
            b.iter_batched(
                RangeTree::<f64, u32>::new,
                |mut tree| {
                    for (i, &key) in keys.iter().enumerate() {
                        tree.insert(key, i as u32);
                    }
                    let mut total = 0usize;
                    for (from, to) in query_windows() {
                        total += tree
                            .range_query(from, to)
                            .iter()
                            .map(|(_, bucket)| bucket.len())
                            .sum::<usize>();
                    }
                    black_box(total);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_interval_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("interval_tree");
    for &n in &[1024usize, 8192] {
        let spans = gen_spans(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("add_search_n{}", n), |b| {
            b.iter_batched(
                IntervalTree::<f64, u32, ()>::new,
                |mut tree| {
                    for (i, &(start, end)) in spans.iter().enumerate() {
                        let _ = tree.add(Interval::new(i as u32, start, end, ()));
                    }
                    let mut total = 0usize;
                    for (from, to) in query_windows() {
                        total += tree.search(from, to).len();
                    }
                    black_box(total);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_heap(c: &mut Criterion) {
    let mut group = c.benchmark_group("heap");
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let values: Vec<u64> = (0..4096).map(|_| rng.next_u64()).collect();
    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("insert_drain_n4096", |b| {
        b.iter_batched(
            || values.clone(),
            |values| {
                let mut heap = MinHeap::new();
                for v in values {
                    heap.insert(v);
                }
                let mut folded = 0u64;
                while let Some(v) = heap.remove_head() {
                    folded ^= v;
                }
                black_box(folded);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lru(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru");
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    let keys: Vec<u64> = (0..4096).map(|_| rng.next_u64() % 512).collect();
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("churn_4096_limit_256", |b| {
        b.iter_batched(
            || LruCache::<u64, u64>::new(256),
            |mut cache| {
                for (i, &key) in keys.iter().enumerate() {
                    cache.set(key, i as u64);
                }
                let mut hits = 0usize;
                for key in 0..512u64 {
                    if cache.get(&key).is_some() {
                        hits += 1;
                    }
                }
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_range_tree,
    bench_interval_tree,
    bench_heap,
    bench_lru,
);
criterion_main!(benches);
