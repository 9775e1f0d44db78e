// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Heap: an array-backed binary min-heap with an injectable comparator.
//!
//! This is the priority-queue primitive for the rest of the Thicket family;
//! `thicket_kdtree` uses it as the bounded top-k buffer during
//! nearest-neighbor search. It is deliberately small:
//!
//! - [`MinHeap::insert`] appends and bubbles the item up.
//! - [`MinHeap::remove_head`] pops the minimum and sinks the last item down.
//! - [`MinHeap::remove`] deletes an arbitrary item by equality.
//! - The ordering is supplied as a comparator, so the same type can live in
//!   differently ordered heaps at once.
//!
//! # Example
//!
//! ```rust
//! use thicket_heap::MinHeap;
//!
//! let mut heap = MinHeap::new();
//! for n in [5, 1, 4, 2, 3] {
//!     heap.insert(n);
//! }
//! assert_eq!(heap.peek(), Some(&1));
//!
//! let mut drained = Vec::new();
//! while let Some(n) = heap.remove_head() {
//!     drained.push(n);
//! }
//! assert_eq!(drained, vec![1, 2, 3, 4, 5]);
//! ```
//!
//! Reversing the comparator turns the structure into a max-heap, which is how
//! a bounded "worst candidate first" buffer is built:
//!
//! ```rust
//! use core::cmp::Ordering;
//! use thicket_heap::MinHeap;
//!
//! let mut worst_first = MinHeap::with_comparator(|a: &f64, b: &f64| {
//!     b.partial_cmp(a).unwrap_or(Ordering::Equal)
//! });
//! worst_first.insert(1.5);
//! worst_first.insert(4.0);
//! worst_first.insert(0.5);
//! assert_eq!(worst_first.peek(), Some(&4.0));
//! ```

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

/// An array-backed binary heap ordered by a comparator.
///
/// The item at the head is the least element under the comparator. With the
/// default comparator (`Ord::cmp`) this is a plain min-heap.
pub struct MinHeap<T, C = fn(&T, &T) -> Ordering> {
    data: Vec<T>,
    compare: C,
}

impl<T: Ord> MinHeap<T> {
    /// Creates an empty heap ordered by [`Ord`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(|a: &T, b: &T| a.cmp(b))
    }
}

impl<T: Ord> Default for MinHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> MinHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty heap ordered by `compare`.
    ///
    /// `compare` must be a total order over the items actually inserted;
    /// for floats, fall back to [`Ordering::Equal`] on incomparable pairs.
    #[must_use]
    pub fn with_comparator(compare: C) -> Self {
        Self {
            data: Vec::new(),
            compare,
        }
    }

    /// Number of items currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the heap holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The least item, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Inserts `item`, restoring heap order by bubbling it up.
    pub fn insert(&mut self, item: T) {
        self.data.push(item);
        self.bubble_up(self.data.len() - 1);
    }

    /// Removes and returns the least item.
    pub fn remove_head(&mut self) -> Option<T> {
        let last = self.data.pop()?;
        if self.data.is_empty() {
            return Some(last);
        }
        let head = core::mem::replace(&mut self.data[0], last);
        self.sink_down(0);
        Some(head)
    }

    /// Removes the first item equal to `item`, returning whether one was found.
    ///
    /// This is a linear scan; the vacated slot is filled with the last element,
    /// which is then re-sifted in whichever direction restores heap order.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let Some(pos) = self.data.iter().position(|x| x == item) else {
            return false;
        };
        let Some(last) = self.data.pop() else {
            return false;
        };
        if pos == self.data.len() {
            // The match was the final slot; nothing to re-sift.
            return true;
        }
        let removed = core::mem::replace(&mut self.data[pos], last);
        if (self.compare)(&self.data[pos], &removed) == Ordering::Less {
            self.bubble_up(pos);
        } else {
            self.sink_down(pos);
        }
        true
    }

    /// Drops all items, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    fn bubble_up(&mut self, mut n: usize) {
        while n > 0 {
            let parent = (n - 1) / 2;
            if (self.compare)(&self.data[n], &self.data[parent]) == Ordering::Less {
                self.data.swap(n, parent);
                n = parent;
            } else {
                break;
            }
        }
    }

    fn sink_down(&mut self, mut n: usize) {
        let len = self.data.len();
        loop {
            let child1 = 2 * n + 1;
            let child2 = 2 * n + 2;
            let mut swap = None;
            if child1 < len && (self.compare)(&self.data[child1], &self.data[n]) == Ordering::Less {
                swap = Some(child1);
            }
            // Compare against whichever of `n`/`child1` currently wins.
            let against = swap.unwrap_or(n);
            if child2 < len
                && (self.compare)(&self.data[child2], &self.data[against]) == Ordering::Less
            {
                swap = Some(child2);
            }
            match swap {
                Some(child) => {
                    self.data.swap(n, child);
                    n = child;
                }
                None => break,
            }
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for MinHeap<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinHeap")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
