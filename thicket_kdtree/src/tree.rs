// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tree, its arena, and the bounded best-first search.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;
use thicket_heap::MinHeap;

use crate::Metric;

struct KdNode<const K: usize, P> {
    point: [f64; K],
    data: P,
    /// Axis this node splits on.
    dimension: usize,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

/// A single result of a nearest-neighbor query, closest first.
#[derive(Clone, Copy, Debug)]
pub struct Neighbor<'a, const K: usize, P> {
    /// Coordinates of the stored point.
    pub point: [f64; K],
    /// Borrowed payload of the stored point.
    pub data: &'a P,
    /// Distance from the query under the tree's metric.
    pub distance: f64,
}

/// A k-d tree over `K`-dimensional points with payloads.
///
/// Nodes live in a slot arena addressed by index, with parent links so
/// removal can unlink structurally instead of re-deriving the path. The tree
/// is balanced once by [`build`](Self::build) and never rebalanced after:
/// `insert` walks to a leaf and `remove` promotes a minimum from a subtree,
/// so a long mutation session can skew the shape. See
/// [`balance_factor`](Self::balance_factor).
///
/// On a node splitting axis `d`, the left subtree holds points with
/// `point[d]` strictly below the node's and the right subtree the rest, ties
/// included.
pub struct KdTree<const K: usize, P> {
    nodes: Vec<Option<KdNode<K, P>>>,
    free_list: Vec<usize>,
    root: Option<usize>,
    metric: Metric<K>,
}

/// A two-dimensional [`KdTree`], the shape the canvas snapping paths use.
pub type KdTree2<P> = KdTree<2, P>;

impl<const K: usize, P> KdTree<K, P> {
    /// Creates an empty tree using `metric` for distances.
    ///
    /// # Panics
    ///
    /// Panics if `K` is zero.
    #[must_use]
    pub fn new(metric: Metric<K>) -> Self {
        assert!(K > 0, "tree needs at least one dimension");
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: None,
            metric,
        }
    }

    /// Builds a balanced tree by recursive median splitting.
    ///
    /// Each level sorts its slice along the level's axis and roots the
    /// median, so the initial height is `ceil(log2(n + 1))`.
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty or `K` is zero.
    #[must_use]
    pub fn build(points: Vec<([f64; K], P)>, metric: Metric<K>) -> Self {
        assert!(!points.is_empty(), "cannot build a tree from no points");
        let mut tree = Self::new(metric);
        tree.root = tree.build_rec(points, 0, None);
        tree
    }

    /// The number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Whether the tree holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree, counting nodes along the longest root-to-leaf path.
    #[must_use]
    pub fn height(&self) -> usize {
        self.root.map_or(0, |root| self.height_of(root))
    }

    /// Height relative to the height of a perfectly balanced tree of the
    /// same size, as `height / log2(len)`.
    ///
    /// `1.0` means balanced; the value climbs as mutation skews the shape.
    /// Trees with fewer than two points report `1.0`.
    #[must_use]
    pub fn balance_factor(&self) -> f64 {
        let count = self.len();
        if count < 2 {
            return 1.0;
        }
        let height = self.height() as f64;
        height / ((count as f64).ln() / core::f64::consts::LN_2)
    }

    /// Inserts `point` by walking to a leaf position.
    ///
    /// No rebalancing happens; sorted insertion orders degrade the tree
    /// toward a list.
    pub fn insert(&mut self, point: [f64; K], data: P) {
        let Some(mut current) = self.root else {
            let node = self.alloc(KdNode {
                point,
                data,
                dimension: 0,
                parent: None,
                left: None,
                right: None,
            });
            self.root = Some(node);
            return;
        };
        loop {
            let entry = self.node(current);
            let dim = entry.dimension;
            let goes_left = point[dim] < entry.point[dim];
            let next = if goes_left { entry.left } else { entry.right };
            match next {
                Some(child) => current = child,
                None => {
                    let node = self.alloc(KdNode {
                        point,
                        data,
                        dimension: (dim + 1) % K,
                        parent: Some(current),
                        left: None,
                        right: None,
                    });
                    let entry = self.node_mut(current);
                    if goes_left {
                        entry.left = Some(node);
                    } else {
                        entry.right = Some(node);
                    }
                    return;
                }
            }
        }
    }

    /// Removes the stored point whose coordinates equal `point`, returning
    /// whether one was found.
    ///
    /// The lookup descends by axis like [`insert`](Self::insert), so only
    /// points reachable by that descent are found. Coordinates compare by
    /// `==`; a NaN coordinate never matches. A leaf is unlinked directly;
    /// an internal node is refilled by promoting the minimum of its right
    /// subtree along its own axis, or of its left subtree, which then
    /// becomes the right.
    pub fn remove(&mut self, point: &[f64; K]) -> bool {
        let Some(target) = self.locate(point) else {
            return false;
        };
        self.remove_node(target);
        true
    }

    /// The `max_nodes` stored points closest to `point`, ascending by
    /// distance.
    ///
    /// Fewer are returned when the tree is smaller than `max_nodes`.
    #[must_use]
    pub fn nearest(&self, point: &[f64; K], max_nodes: usize) -> Vec<Neighbor<'_, K, P>> {
        self.nearest_within(point, max_nodes, f64::INFINITY)
    }

    /// Like [`nearest`](Self::nearest), but only points strictly closer than
    /// `max_distance` (in metric units) are considered.
    #[must_use]
    pub fn nearest_within(
        &self,
        point: &[f64; K],
        max_nodes: usize,
        max_distance: f64,
    ) -> Vec<Neighbor<'_, K, P>> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if max_nodes == 0 {
            return Vec::new();
        }
        let mut kept = MinHeap::with_comparator(worst_first);
        self.search_down(root, point, max_nodes, max_distance, &mut kept);
        let mut neighbors = Vec::with_capacity(kept.len());
        while let Some((idx, distance)) = kept.remove_head() {
            let node = self.node(idx);
            neighbors.push(Neighbor {
                point: node.point,
                data: &node.data,
                distance,
            });
        }
        neighbors.reverse();
        neighbors
    }

    /// Iterates the stored points and payloads in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64; K], &P)> {
        self.nodes
            .iter()
            .filter_map(|slot| slot.as_ref().map(|node| (&node.point, &node.data)))
    }

    fn build_rec(
        &mut self,
        mut points: Vec<([f64; K], P)>,
        depth: usize,
        parent: Option<usize>,
    ) -> Option<usize> {
        if points.is_empty() {
            return None;
        }
        let dim = depth % K;
        points.sort_unstable_by(|a, b| a.0[dim].total_cmp(&b.0[dim]));
        let median = points.len() / 2;
        let mut median_and_right = points.split_off(median);
        let right_points = median_and_right.split_off(1);
        let (point, data) = median_and_right.pop().expect("median split leaves one element");
        let node = self.alloc(KdNode {
            point,
            data,
            dimension: dim,
            parent,
            left: None,
            right: None,
        });
        let left = self.build_rec(points, depth + 1, Some(node));
        let right = self.build_rec(right_points, depth + 1, Some(node));
        let entry = self.node_mut(node);
        entry.left = left;
        entry.right = right;
        Some(node)
    }

    /// Dimension-guided descent to the first node with equal coordinates.
    fn locate(&self, point: &[f64; K]) -> Option<usize> {
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            if node.point == *point {
                return Some(idx);
            }
            let dim = node.dimension;
            cursor = if point[dim] < node.point[dim] {
                node.left
            } else {
                node.right
            };
        }
        None
    }

    fn remove_node(&mut self, idx: usize) {
        let (left, right, dimension) = {
            let node = self.node(idx);
            (node.left, node.right, node.dimension)
        };
        if left.is_none() && right.is_none() {
            let node = self.release(idx);
            match node.parent {
                None => self.root = None,
                Some(parent) => {
                    let entry = self.node_mut(parent);
                    if entry.left == Some(idx) {
                        entry.left = None;
                    } else {
                        debug_assert_eq!(entry.right, Some(idx), "parent does not link this child");
                        entry.right = None;
                    }
                }
            }
            return;
        }
        if let Some(right_root) = right {
            // Promote the right subtree's minimum along this node's axis,
            // then delete the promoted value from where it came.
            let donor = self.find_min(right_root, dimension);
            self.swap_payload(idx, donor);
            self.remove_node(donor);
        } else {
            let left_root = left.expect("non-leaf node missing both children");
            let donor = self.find_min(left_root, dimension);
            self.swap_payload(idx, donor);
            self.remove_node(donor);
            // The promoted value is the left subtree's minimum, so what is
            // left of that subtree belongs on the right.
            let node = self.node_mut(idx);
            node.right = node.left.take();
        }
    }

    /// The node holding the smallest coordinate along `dim` in `idx`'s
    /// subtree.
    fn find_min(&self, idx: usize, dim: usize) -> usize {
        let node = self.node(idx);
        if node.dimension == dim {
            return match node.left {
                Some(left) => self.find_min(left, dim),
                None => idx,
            };
        }
        let mut best = idx;
        if let Some(left) = node.left {
            let candidate = self.find_min(left, dim);
            if self.node(candidate).point[dim] < self.node(best).point[dim] {
                best = candidate;
            }
        }
        if let Some(right) = node.right {
            let candidate = self.find_min(right, dim);
            if self.node(candidate).point[dim] < self.node(best).point[dim] {
                best = candidate;
            }
        }
        best
    }

    fn search_down<C>(
        &self,
        idx: usize,
        query: &[f64; K],
        max_nodes: usize,
        max_distance: f64,
        kept: &mut MinHeap<(usize, f64), C>,
    ) where
        C: Fn(&(usize, f64), &(usize, f64)) -> Ordering,
    {
        let node = self.node(idx);
        let own_distance = (self.metric)(query, &node.point);
        let dim = node.dimension;

        // The query's side of the hyperplane, or the only child.
        let near = if node.right.is_none() {
            node.left
        } else if node.left.is_none() {
            node.right
        } else if query[dim] < node.point[dim] {
            node.left
        } else {
            node.right
        };
        let Some(near) = near else {
            if own_distance < cutoff(kept, max_nodes, max_distance) {
                save(kept, idx, own_distance, max_nodes);
            }
            return;
        };

        self.search_down(near, query, max_nodes, max_distance, kept);

        if own_distance < cutoff(kept, max_nodes, max_distance) {
            save(kept, idx, own_distance, max_nodes);
        }

        // Distance from the query to the splitting hyperplane, in metric
        // units: the node's point with the query's coordinate on this axis.
        let wall_distance = {
            let mut wall = node.point;
            wall[dim] = query[dim];
            (self.metric)(&wall, &node.point)
        };
        if wall_distance.abs() < cutoff(kept, max_nodes, max_distance) {
            let far = if Some(near) == node.left {
                node.right
            } else {
                node.left
            };
            if let Some(far) = far {
                self.search_down(far, query, max_nodes, max_distance, kept);
            }
        }
    }

    fn height_of(&self, idx: usize) -> usize {
        let node = self.node(idx);
        let left = node.left.map_or(0, |child| self.height_of(child));
        let right = node.right.map_or(0, |child| self.height_of(child));
        1 + left.max(right)
    }

    fn node(&self, idx: usize) -> &KdNode<K, P> {
        self.nodes[idx].as_ref().expect("dangling node index")
    }

    fn node_mut(&mut self, idx: usize) -> &mut KdNode<K, P> {
        self.nodes[idx].as_mut().expect("dangling node index")
    }

    fn alloc(&mut self, node: KdNode<K, P>) -> usize {
        match self.free_list.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> KdNode<K, P> {
        let node = self.nodes[idx].take().expect("dangling node index");
        self.free_list.push(idx);
        node
    }

    /// Swaps the stored point and payload of two nodes, leaving their links
    /// untouched.
    fn swap_payload(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b, "payload swap needs two distinct nodes");
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(high);
        let first = head[low].as_mut().expect("dangling node index");
        let second = tail[0].as_mut().expect("dangling node index");
        core::mem::swap(&mut first.point, &mut second.point);
        core::mem::swap(&mut first.data, &mut second.data);
    }
}

impl<P> KdTree2<P> {
    /// Builds a 2D tree from `kurbo` points under [`squared_euclidean`].
    ///
    /// # Panics
    ///
    /// Panics if `points` is empty.
    ///
    /// [`squared_euclidean`]: crate::squared_euclidean
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = (Point, P)>) -> Self {
        let points = points
            .into_iter()
            .map(|(point, data)| ([point.x, point.y], data))
            .collect();
        Self::build(points, crate::squared_euclidean)
    }

    /// Inserts a `kurbo` point.
    pub fn insert_point(&mut self, at: Point, data: P) {
        self.insert([at.x, at.y], data);
    }

    /// Removes the stored point with exactly these coordinates.
    pub fn remove_point(&mut self, at: Point) -> bool {
        self.remove(&[at.x, at.y])
    }

    /// The `max_nodes` stored points closest to `at`, ascending by distance.
    #[must_use]
    pub fn nearest_point(&self, at: Point, max_nodes: usize) -> Vec<Neighbor<'_, 2, P>> {
        self.nearest(&[at.x, at.y], max_nodes)
    }
}

impl<P> Default for KdTree2<P> {
    /// An empty 2D tree under [`squared_euclidean`](crate::squared_euclidean).
    fn default() -> Self {
        Self::new(crate::squared_euclidean)
    }
}

impl<const K: usize, P> fmt::Debug for KdTree<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KdTree")
            .field("dimensions", &K)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Orders heap entries so the worst kept distance sits at the head.
fn worst_first(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
}

/// The distance a new candidate has to beat.
fn cutoff<C>(kept: &MinHeap<(usize, f64), C>, max_nodes: usize, max_distance: f64) -> f64
where
    C: Fn(&(usize, f64), &(usize, f64)) -> Ordering,
{
    if kept.len() < max_nodes {
        max_distance
    } else {
        kept.peek().map_or(max_distance, |&(_, worst)| worst)
    }
}

fn save<C>(kept: &mut MinHeap<(usize, f64), C>, idx: usize, distance: f64, max_nodes: usize)
where
    C: Fn(&(usize, f64), &(usize, f64)) -> Ordering,
{
    kept.insert((idx, distance));
    if kept.len() > max_nodes {
        kept.remove_head();
    }
}
