// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The quadtree itself.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashSet;
use kurbo::Rect;
use smallvec::SmallVec;

/// Split threshold used by [`QuadTree::new`]: a node subdivides once it holds
/// more than this many items.
pub const DEFAULT_MAX_ITEMS: usize = 10;

/// Depth limit used by [`QuadTree::new`]: nodes at this depth never subdivide.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// An entry stored in the tree: identity, bounds, payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Item<I, P> {
    /// Caller-supplied identity.
    pub id: I,
    /// Axis-aligned bounds the item is filed under.
    pub bounds: Rect,
    /// Payload carried with the item.
    pub data: P,
}

/// One node of the partition. Items are held as indices into the tree's slot
/// table so a straddler duplicated across quadrants is stored once.
struct Quad {
    bounds: Rect,
    depth: usize,
    slots: SmallVec<[usize; 8]>,
    /// Child quadrants in order `[top right, top left, bottom left, bottom
    /// right]`, where "top" is the low-y half.
    children: Option<Box<[Quad; 4]>>,
}

/// A quadtree over axis-aligned boxes.
///
/// Items keep insertion order in an internal slot table; the quadrants only
/// reference slots. Items are never required to lie inside the tree's bounds:
/// an outlying box is filed under the quadrants nearest to it and remains
/// searchable.
///
/// See the [crate docs](crate) for the candidate-set search contract and a
/// worked example.
pub struct QuadTree<I, P> {
    max_items: usize,
    max_depth: usize,
    items: Vec<Item<I, P>>,
    root: Quad,
}

impl<I, P> QuadTree<I, P>
where
    I: Clone + Eq + Hash,
    P: Clone,
{
    /// Creates an empty tree over `bounds` with the default limits.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self::with_limits(bounds, DEFAULT_MAX_ITEMS, DEFAULT_MAX_DEPTH)
    }

    /// Creates an empty tree with explicit split threshold and depth limit.
    #[must_use]
    pub fn with_limits(bounds: Rect, max_items: usize, max_depth: usize) -> Self {
        Self {
            max_items,
            max_depth,
            items: Vec::new(),
            root: Quad::new(bounds, 0),
        }
    }

    /// The region this tree partitions.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    /// Split threshold per node.
    #[must_use]
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Depth at which nodes stop subdividing.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The number of stored items.
    ///
    /// Unlike [`count`](Self::count), an item duplicated across quadrants is
    /// counted once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the tree holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stores `data` under `id`, filed by `bounds`.
    ///
    /// Identities are not required to be unique here; removal takes every
    /// item matching the id with it.
    pub fn insert(&mut self, id: I, bounds: Rect, data: P) {
        let slot = self.items.len();
        self.items.push(Item { id, bounds, data });
        let Self {
            root,
            items,
            max_items,
            max_depth,
            ..
        } = self;
        root.insert(slot, items.as_slice(), *max_items, *max_depth);
    }

    /// Candidates overlapping `rect`, de-duplicated, in no particular order.
    ///
    /// Every stored item whose bounds overlap `rect` with positive area is
    /// in the result; items from the same leaves ride along. See the
    /// [crate docs](crate) for the contract.
    #[must_use]
    pub fn search(&self, rect: Rect) -> Vec<&Item<I, P>> {
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        self.root.collect(rect, &self.items, &mut seen, &mut hits);
        hits
    }

    /// The number of per-quadrant references, straddlers counted once per
    /// quadrant holding them.
    #[must_use]
    pub fn count(&self) -> usize {
        self.root.count()
    }

    /// A fresh tree with every item matching `id` left out.
    ///
    /// The original tree is not modified; discarding the return value makes
    /// the call a no-op. Removing an absent id simply yields an equivalent
    /// copy.
    #[must_use]
    pub fn remove(&self, id: &I) -> Self {
        self.rebuild(|item| item.id != *id)
    }

    /// A fresh tree with every item matching any id in `ids` left out.
    ///
    /// Same contract as [`remove`](Self::remove).
    #[must_use]
    pub fn remove_all<'a>(&self, ids: impl IntoIterator<Item = &'a I>) -> Self
    where
        I: 'a,
    {
        let doomed: HashSet<&I> = ids.into_iter().collect();
        self.rebuild(|item| !doomed.contains(&item.id))
    }

    /// Drops every item, keeping the bounds and limits.
    pub fn clear(&mut self) {
        self.items.clear();
        self.root = Quad::new(self.root.bounds, 0);
    }

    /// Iterates the stored items in insertion order.
    pub fn items(&self) -> core::slice::Iter<'_, Item<I, P>> {
        self.items.iter()
    }

    fn rebuild(&self, keep: impl Fn(&Item<I, P>) -> bool) -> Self {
        let mut next = Self::with_limits(self.bounds(), self.max_items, self.max_depth);
        for item in self.items.iter().filter(|item| keep(item)) {
            next.insert(item.id.clone(), item.bounds, item.data.clone());
        }
        next
    }
}

impl<I, P> fmt::Debug for QuadTree<I, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.root.bounds)
            .field("len", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl Quad {
    fn new(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            slots: SmallVec::new(),
            children: None,
        }
    }

    fn insert<I, P>(
        &mut self,
        slot: usize,
        items: &[Item<I, P>],
        max_items: usize,
        max_depth: usize,
    ) {
        if self.children.is_some() {
            self.file_into_children(slot, items, max_items, max_depth);
            return;
        }
        self.slots.push(slot);
        if self.slots.len() > max_items && self.depth < max_depth {
            self.split();
            let pending = core::mem::take(&mut self.slots);
            for moved in pending {
                self.file_into_children(moved, items, max_items, max_depth);
            }
        }
    }

    /// Files `slot` into every child quadrant its bounds touch.
    ///
    /// Degenerate bounds can sit exactly on both midlines and touch no
    /// quadrant; those stay on this node instead of being dropped.
    fn file_into_children<I, P>(
        &mut self,
        slot: usize,
        items: &[Item<I, P>],
        max_items: usize,
        max_depth: usize,
    ) {
        let matched = touched(self.bounds, items[slot].bounds);
        if matched.iter().any(|&hit| hit) {
            let children = self.children.as_deref_mut().expect("filing requires children");
            for (child, hit) in children.iter_mut().zip(matched) {
                if hit {
                    child.insert(slot, items, max_items, max_depth);
                }
            }
        } else {
            self.slots.push(slot);
        }
    }

    fn split(&mut self) {
        let Rect { x0, y0, x1, y1 } = self.bounds;
        let center = self.bounds.center();
        let depth = self.depth + 1;
        let quarter = |x0, y0, x1, y1| Self::new(Rect::new(x0, y0, x1, y1), depth);
        self.children = Some(Box::new([
            quarter(center.x, y0, x1, center.y),
            quarter(x0, y0, center.x, center.y),
            quarter(x0, center.y, center.x, y1),
            quarter(center.x, center.y, x1, y1),
        ]));
    }

    fn collect<'t, I, P>(
        &self,
        rect: Rect,
        items: &'t [Item<I, P>],
        seen: &mut HashSet<usize>,
        hits: &mut Vec<&'t Item<I, P>>,
    ) {
        for &slot in &self.slots {
            if seen.insert(slot) {
                hits.push(&items[slot]);
            }
        }
        if let Some(children) = self.children.as_deref() {
            let matched = touched(self.bounds, rect);
            if matched.iter().any(|&hit| hit) {
                for (child, hit) in children.iter().zip(matched) {
                    if hit {
                        child.collect(rect, items, seen, hits);
                    }
                }
            } else {
                // A degenerate query on both midlines touches everything.
                for child in children.iter() {
                    child.collect(rect, items, seen, hits);
                }
            }
        }
    }

    fn count(&self) -> usize {
        let mut total = self.slots.len();
        if let Some(children) = self.children.as_deref() {
            total += children.iter().map(Self::count).sum::<usize>();
        }
        total
    }
}

/// Which child quadrants `rect` touches, in child order.
///
/// A rect is filed strictly: it touches the low half of an axis only if it
/// starts before the midline, and the high half only if it ends past it. A
/// rect that merely abuts the midline from one side stays on that side.
fn touched(bounds: Rect, rect: Rect) -> [bool; 4] {
    let center = bounds.center();
    let starts_top = rect.y0 < center.y;
    let starts_left = rect.x0 < center.x;
    let ends_right = rect.x1 > center.x;
    let ends_bottom = rect.y1 > center.y;
    [
        starts_top && ends_right,
        starts_left && starts_top,
        starts_left && ends_bottom,
        ends_right && ends_bottom,
    ]
}
