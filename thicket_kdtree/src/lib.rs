// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A k-d tree for nearest-neighbor queries over fixed-dimension points.
//!
//! [`KdTree`] splits `K`-dimensional points across axes by depth, balancing
//! itself once at [`KdTree::build`] time via median splitting. Later
//! [`KdTree::insert`] and [`KdTree::remove`] calls mutate the shape without
//! rebalancing, which keeps removal cheap and node identity stable but lets
//! pathological mutation orders skew the tree; [`KdTree::balance_factor`]
//! measures the skew so callers can decide when a rebuild pays off.
//!
//! [`KdTree::nearest`] is a bounded best-first search: it keeps the `k` best
//! candidates in a worst-first heap and only crosses a splitting hyperplane
//! when the far side could still beat the current cut-off.
//!
//! ```
//! use thicket_kdtree::{KdTree, squared_euclidean};
//!
//! let tree = KdTree::build(
//!     vec![
//!         ([2.0, 3.0], "a"),
//!         ([5.0, 4.0], "b"),
//!         ([9.0, 6.0], "c"),
//!         ([4.0, 7.0], "d"),
//!         ([8.0, 1.0], "e"),
//!         ([7.0, 2.0], "f"),
//!     ],
//!     squared_euclidean,
//! );
//!
//! let hits = tree.nearest(&[9.0, 2.0], 2);
//! assert_eq!(hits[0].data, &"e");
//! assert_eq!(hits[1].data, &"f");
//! assert!(hits[0].distance < hits[1].distance);
//! ```
//!
//! ## Features
//!
//! - `std` (enabled by default): get floating point functions from the
//!   standard library.
//! - `libm`: use floating point functions from [`libm`] instead, allowing
//!   `no_std` use.
//!
//! [`libm`]: https://crates.io/crates/libm

#![no_std]

extern crate alloc;

mod tree;

pub use tree::{KdTree, KdTree2, Neighbor};

/// Distance function ordering the results of [`KdTree::nearest`].
///
/// A plain function pointer, so the metric never leaks into the tree's type.
/// The metric only needs to be monotone in true distance for hyperplane
/// pruning to stay exact, which is why [`squared_euclidean`] skips the square
/// root.
pub type Metric<const K: usize> = fn(&[f64; K], &[f64; K]) -> f64;

/// Sum of squared per-axis differences.
///
/// The default metric for [`KdTree2`]. Distances it reports are squared;
/// compare them against squared radii.
#[must_use]
pub fn squared_euclidean<const K: usize>(a: &[f64; K], b: &[f64; K]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
