// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=thicket_interval_tree --heading-base-level=0

//! A self-balancing interval tree for one-dimensional overlap queries.
//!
//! [`IntervalTree`] stores closed intervals keyed by their start, keeps an
//! AVL balance on every path, and augments each node with the maximum end
//! seen in its subtree. That augment lets point and stab queries prune whole
//! subtrees, so lookups stay logarithmic even when every stored interval is
//! long. Each interval also carries a caller-supplied identity, and the tree
//! maintains a side index from identity to span so an interval can be removed
//! without knowing where it currently lies.
//!
//! Typical uses are guide and snapping lookups along one axis: "which rows
//! does this band of y coordinates touch" is a single [`IntervalTree::search`].
//!
//! ```
//! use thicket_interval_tree::{Interval, IntervalTree};
//!
//! let mut rows = IntervalTree::new();
//! rows.add(Interval::new("row-1", 0.0, 120.0, ()));
//! rows.add(Interval::new("row-2", 100.0, 180.0, ()));
//! rows.add(Interval::new("row-3", 300.0, 420.0, ()));
//!
//! assert!(rows.contains(110.0));
//! assert_eq!(rows.search(90.0, 130.0).len(), 2);
//!
//! rows.remove_by_id(&"row-2");
//! assert!(rows.search(150.0, 200.0).is_empty());
//! ```
//!
//! Endpoints may be any [`Copy`] + [`PartialOrd`] scalar. Overlap is
//! inclusive at both ends, so intervals that merely touch still match.

#![no_std]

extern crate alloc;

mod tree;
mod util;

pub use tree::IntervalTree;

use crate::util::le;

/// A closed interval together with its identity and payload.
///
/// `start` and `end` are both part of the interval, and an interval may be
/// degenerate (`start == end`). The identity is what [`IntervalTree`] indexes
/// for [`IntervalTree::remove_by_id`] and [`IntervalTree::get`]; the payload
/// rides along untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval<T, I, D> {
    /// Caller-supplied identity, unique per tree.
    pub id: I,
    /// Inclusive lower endpoint.
    pub start: T,
    /// Inclusive upper endpoint.
    pub end: T,
    /// Payload carried with the interval.
    pub data: D,
}

impl<T: Copy + PartialOrd, I, D> Interval<T, I, D> {
    /// Creates an interval spanning `start..=end`.
    ///
    /// # Panics
    ///
    /// Panics if `start` and `end` are out of order or incomparable.
    #[must_use]
    pub fn new(id: I, start: T, end: T, data: D) -> Self {
        assert!(le(start, end), "malformed interval: start must not exceed end");
        Self { id, start, end, data }
    }

    /// Creates a degenerate interval covering the single value `at`.
    #[must_use]
    pub fn point(id: I, at: T, data: D) -> Self {
        Self { id, start: at, end: at, data }
    }

    /// The `(start, end)` endpoints as a pair.
    #[must_use]
    pub fn span(&self) -> (T, T) {
        (self.start, self.end)
    }

    /// Whether this interval overlaps `start..=end`, endpoints included.
    #[must_use]
    pub fn overlaps(&self, start: T, end: T) -> bool {
        le(self.start, end) && le(start, self.end)
    }
}
