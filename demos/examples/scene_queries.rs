// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One frame of canvas bookkeeping, wired through the Thicket indexes.
//!
//! This example stages a small scene and runs the queries an editor issues
//! while the user pans and drags:
//! - `thicket_quadtree` culls shapes down to viewport candidates,
//! - `thicket_range_tree` orders the survivors by z-index,
//! - `thicket_interval_tree` finds the rows the viewport cuts through,
//! - `thicket_kdtree` snaps the pointer to nearby anchors,
//! - `thicket_lru` keeps recently rendered tiles warm,
//! - `thicket_heap` drains queued edits in timestamp order.
//!
//! Run:
//! - `cargo run -p thicket_demos --example scene_queries`

use std::ops::Range;

use kurbo::{Point, Rect};
use thicket_heap::MinHeap;
use thicket_interval_tree::{Interval, IntervalTree};
use thicket_kdtree::KdTree2;
use thicket_lru::LruCache;
use thicket_quadtree::QuadTree;
use thicket_range_tree::RangeTree;

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Renders two rows of tiles, pulling from the cache where possible.
fn render_tiles(cache: &mut LruCache<(i64, i64), u64>, cols: Range<i64>) -> (usize, usize) {
    let mut hits = 0usize;
    let mut misses = 0usize;
    for ty in 0..2 {
        for tx in cols.clone() {
            if cache.get(&(tx, ty)).is_some() {
                hits += 1;
            } else {
                misses += 1;
                cache.set((tx, ty), (tx * 31 + ty * 7) as u64);
            }
        }
    }
    (hits, misses)
}

fn main() {
    // A handful of shapes spread over a 1280x800 canvas, each with a z-index.
    let shapes: Vec<(u32, Rect, &str, i32)> = vec![
        (1, Rect::new(40.0, 60.0, 220.0, 180.0), "card", 2),
        (2, Rect::new(180.0, 120.0, 420.0, 300.0), "photo", 5),
        (3, Rect::new(400.0, 40.0, 560.0, 140.0), "label", 1),
        (4, Rect::new(560.0, 420.0, 900.0, 620.0), "frame", 3),
        (5, Rect::new(900.0, 80.0, 1240.0, 360.0), "sidebar", 0),
        (6, Rect::new(300.0, 340.0, 380.0, 390.0), "button", 8),
    ];

    let mut culling = QuadTree::new(Rect::new(0.0, 0.0, 1280.0, 800.0));
    for &(id, bounds, label, _) in &shapes {
        culling.insert(id, bounds, label);
    }

    let viewport = Rect::new(0.0, 0.0, 640.0, 400.0);
    println!("== Viewport cull @ {:?} ==", viewport);

    // The quadtree hands back candidates; exact overlap is the caller's job.
    let candidates = culling.search(viewport);
    println!(
        "candidates: {:?}",
        candidates.iter().map(|item| item.data).collect::<Vec<_>>()
    );
    let visible: Vec<u32> = candidates
        .iter()
        .filter(|item| overlaps(item.bounds, viewport))
        .map(|item| item.id)
        .collect();
    println!("visible after the exact pass: {:?}", visible);

    // Order the visible shapes back-to-front by z-index.
    let mut draw_order = RangeTree::new();
    for &(id, _, _, z) in shapes.iter().filter(|(id, ..)| visible.contains(id)) {
        draw_order.insert(z, id);
    }
    println!("\n== Draw order (z ascending) ==");
    for (z, ids) in draw_order.range_query(i32::MIN, i32::MAX) {
        println!("  z={z}: shapes {ids:?}");
    }

    // Document rows as vertical spans; the viewport stabs them.
    let mut rows = IntervalTree::new();
    for (row, span) in [(0_u32, (0.0, 120.0)), (1, (120.0, 420.0)), (2, (420.0, 800.0))] {
        let _ = rows.add(Interval::new(row, span.0, span.1, "row"));
    }
    let cut: Vec<u32> = rows
        .search(viewport.y0, viewport.y1)
        .iter()
        .map(|iv| iv.id)
        .collect();
    println!("\n== Rows cut by the viewport: {:?} ==", cut);

    // Snap the pointer to the nearest anchors (grid corners of the shapes).
    let anchors: Vec<(Point, u32)> = shapes
        .iter()
        .flat_map(|&(id, r, _, _)| {
            [
                (Point::new(r.x0, r.y0), id),
                (Point::new(r.x1, r.y1), id),
            ]
        })
        .collect();
    let snapping = KdTree2::from_points(anchors);
    let cursor = Point::new(410.0, 310.0);
    println!("\n== Snap candidates near ({:.0}, {:.0}) ==", cursor.x, cursor.y);
    for hit in snapping.nearest_point(cursor, 3) {
        println!(
            "  shape {} corner ({:.0}, {:.0}) at {:.1}px",
            hit.data,
            hit.point[0],
            hit.point[1],
            hit.distance.sqrt()
        );
    }

    // Tile cache across render passes; panning right evicts the stale column.
    let mut tiles: LruCache<(i64, i64), u64> = LruCache::new(8);
    println!("\n== Tile cache (limit {}) ==", tiles.limit());
    for (label, cols) in [("cold pass", 0..4), ("warm pass", 0..4), ("pan right", 1..5)] {
        let (hits, misses) = render_tiles(&mut tiles, cols);
        println!("  {label}: {hits} hits, {misses} misses");
    }
    println!("  column 0 evicted: {}", !tiles.contains(&(0, 0)));

    // Queued edits drain oldest-first regardless of arrival order.
    let mut edits = MinHeap::with_comparator(|a: &(u64, &str), b: &(u64, &str)| a.0.cmp(&b.0));
    for edit in [(1840, "resize frame"), (1710, "move photo"), (1995, "retitle label")] {
        edits.insert(edit);
    }
    println!("\n== Edit queue ==");
    while let Some((at, what)) = edits.remove_head() {
        println!("  t={at}: {what}");
    }
}
