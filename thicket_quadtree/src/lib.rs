// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=thicket_quadtree --heading-base-level=0

//! A quadtree index over axis-aligned bounding boxes.
//!
//! [`QuadTree`] files each inserted box into every quadrant it overlaps, so
//! an item straddling a split boundary is referenced from more than one leaf.
//! [`QuadTree::search`] therefore returns a de-duplicated *candidate set*: it
//! never misses an item whose bounds overlap the query, but it may include
//! near neighbors from the same leaves. Callers that need exact hits filter
//! the candidates against their own geometry, which is usually far richer
//! than a box anyway.
//!
//! Removal does not mutate in place. [`QuadTree::remove`] and
//! [`QuadTree::remove_all`] rebuild a fresh tree from the surviving items and
//! return it, leaving the original untouched. That keeps an old handle
//! readable while the replacement is being swapped in, at the cost of a full
//! rebuild per removal.
//!
//! ```
//! use kurbo::Rect;
//! use thicket_quadtree::QuadTree;
//!
//! let mut shapes = QuadTree::new(Rect::new(0.0, 0.0, 1024.0, 768.0));
//! shapes.insert("frame-1", Rect::new(40.0, 40.0, 200.0, 120.0), ());
//! shapes.insert("frame-2", Rect::new(180.0, 100.0, 360.0, 240.0), ());
//! shapes.insert("note-1", Rect::new(700.0, 500.0, 760.0, 560.0), ());
//!
//! let hits = shapes.search(Rect::new(150.0, 90.0, 220.0, 130.0));
//! assert!(hits.iter().any(|item| item.id == "frame-1"));
//!
//! let without_notes = shapes.remove(&"note-1");
//! assert_eq!(without_notes.len(), 2);
//! assert_eq!(shapes.len(), 3, "the original handle is untouched");
//! ```

#![no_std]

extern crate alloc;

mod tree;

pub use tree::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITEMS, Item, QuadTree};
