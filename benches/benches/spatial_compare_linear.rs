// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use thicket_kdtree::{KdTree, squared_euclidean};
use thicket_quadtree::QuadTree;

const SCENE: Rect = Rect::new(0.0, 0.0, 2000.0, 2000.0);

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

fn gen_scene_rects(count: usize, size: f64) -> Vec<Rect> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    for _ in 0..count {
        let x0 = rng.next_f64() * (SCENE.width() - size);
        let y0 = rng.next_f64() * (SCENE.height() - size);
        out.push(Rect::new(x0, y0, x0 + size, y0 + size));
    }
    out
}

fn gen_anchor_points(count: usize) -> Vec<([f64; 2], u32)> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    for i in 0..count {
        out.push((
            [
                rng.next_f64() * SCENE.width(),
                rng.next_f64() * SCENE.height(),
            ],
            i as u32,
        ));
    }
    out
}

fn gen_queries(count: usize) -> Vec<[f64; 2]> {
    let mut out = Vec::with_capacity(count);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    for _ in 0..count {
        out.push([
            rng.next_f64() * SCENE.width(),
            rng.next_f64() * SCENE.height(),
        ]);
    }
    out
}

fn sliding_viewports() -> impl Iterator<Item = Rect> {
    (0..256).map(|q| {
        let x = (q % 16) as f64 * 110.0;
        let y = (q / 16) as f64 * 110.0;
        Rect::new(x, y, x + 220.0, y + 220.0)
    })
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn bench_quadtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");
    for &n in &[256usize, 1024, 4096] {
        let rects = gen_scene_rects(n, 24.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("insert_search_n{}", n), |b| {
            b.iter_batched(
                || QuadTree::new(SCENE),
                |mut tree| {
                    for (i, r) in rects.iter().copied().enumerate() {
                        tree.insert(i as u32, r, ());
                    }
                    let hits = tree.search(Rect::new(800.0, 800.0, 1200.0, 1200.0)).len();
                    black_box(hits);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_quadtree_query_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_query_heavy");
    let rects = gen_scene_rects(4096, 24.0);
    group.bench_function("cull_256_viewports", |b| {
        b.iter_batched(
            || {
                let mut tree = QuadTree::new(SCENE);
                for (i, r) in rects.iter().copied().enumerate() {
                    tree.insert(i as u32, r, ());
                }
                tree
            },
            |tree| {
                let mut total = 0usize;
                for viewport in sliding_viewports() {
                    total += tree.search(viewport).len();
                }
                black_box(total);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_linear_rects(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_rects");
    let rects = gen_scene_rects(4096, 24.0);
    group.bench_function("cull_256_viewports", |b| {
        b.iter_batched(
            || rects.clone(),
            |rects| {
                let mut total = 0usize;
                for viewport in sliding_viewports() {
                    total += rects.iter().filter(|&&r| overlaps(r, viewport)).count();
                }
                black_box(total);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_kdtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdtree");
    for &n in &[1024usize, 8192] {
        let points = gen_anchor_points(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("build_n{}", n), |b| {
            b.iter_batched(
                || points.clone(),
                |points| {
                    let tree = KdTree::build(points, squared_euclidean);
                    black_box(tree.height());
                },
                BatchSize::SmallInput,
            )
        });
    }
    let points = gen_anchor_points(8192);
    let queries = gen_queries(64);
    group.bench_function("nearest8_64_queries", |b| {
        b.iter_batched(
            || KdTree::build(points.clone(), squared_euclidean),
            |tree| {
                let mut total = 0.0f64;
                for q in &queries {
                    for hit in tree.nearest(q, 8) {
                        total += hit.distance;
                    }
                }
                black_box(total);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_linear_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_nearest");
    let points = gen_anchor_points(8192);
    let queries = gen_queries(64);
    group.bench_function("nearest8_64_queries", |b| {
        b.iter_batched(
            || points.clone(),
            |points| {
                let mut total = 0.0f64;
                for q in &queries {
                    let mut distances: Vec<f64> = points
                        .iter()
                        .map(|(p, _)| squared_euclidean(p, q))
                        .collect();
                    distances.sort_unstable_by(f64::total_cmp);
                    distances.truncate(8);
                    total += distances.iter().sum::<f64>();
                }
                black_box(total);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_quadtree,
    bench_quadtree_query_heavy,
    bench_linear_rects,
    bench_kdtree,
    bench_linear_nearest,
);
criterion_main!(benches);
