// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The balanced tree behind [`IntervalTree`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::Interval;
use crate::util::{ge, le, lt, max_of};

type Link<T, I, D> = Option<Box<Node<T, I, D>>>;

struct Node<T, I, D> {
    interval: Interval<T, I, D>,
    /// Largest `end` of any interval in this subtree.
    max_end: T,
    /// Height of this subtree, counting this node.
    height: u32,
    left: Link<T, I, D>,
    right: Link<T, I, D>,
}

impl<T: Copy + PartialOrd, I, D> Node<T, I, D> {
    fn new(interval: Interval<T, I, D>) -> Self {
        let max_end = interval.end;
        Self {
            interval,
            max_end,
            height: 1,
            left: None,
            right: None,
        }
    }

    /// Recomputes `height` and `max_end` from the children.
    ///
    /// Must run on every node whose subtree changed, deepest first.
    fn refresh(&mut self) {
        let left_height = self.left.as_deref().map_or(0, |node| node.height);
        let right_height = self.right.as_deref().map_or(0, |node| node.height);
        self.height = 1 + left_height.max(right_height);
        let mut max_end = self.interval.end;
        if let Some(left) = self.left.as_deref() {
            max_end = max_of(max_end, left.max_end);
        }
        if let Some(right) = self.right.as_deref() {
            max_end = max_of(max_end, right.max_end);
        }
        self.max_end = max_end;
    }

    /// Left subtree height minus right subtree height.
    fn balance(&self) -> i64 {
        let left_height = self.left.as_deref().map_or(0, |node| node.height);
        let right_height = self.right.as_deref().map_or(0, |node| node.height);
        i64::from(left_height) - i64::from(right_height)
    }
}

/// An AVL-balanced interval tree with an identity index.
///
/// Intervals are ordered by start, ties descending to the left. Every node
/// carries the maximum end of its subtree, which is what lets
/// [`contains`](Self::contains) and [`search`](Self::search) skip subtrees
/// that end before the query begins. The span of each interval doubles as
/// its structural key, so two intervals with identical `(start, end)` cannot
/// coexist; identities are free-form and resolved through a side table.
///
/// See the [crate docs](crate) for a worked example.
pub struct IntervalTree<T, I, D> {
    root: Link<T, I, D>,
    /// Identity to `(start, end)` of the interval registered under it.
    spans: HashMap<I, (T, T)>,
}

impl<T, I, D> IntervalTree<T, I, D>
where
    T: Copy + PartialOrd,
    I: Clone + Eq + Hash,
{
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            spans: HashMap::new(),
        }
    }

    /// The number of stored intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the tree holds no intervals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree, counting nodes along the longest root-to-leaf path.
    ///
    /// An empty tree has height `0`, a single interval height `1`.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.root.as_deref().map_or(0, |node| node.height)
    }

    /// Inserts `interval`, returning whether it was stored.
    ///
    /// If an interval with the same span already exists the call is a no-op
    /// and returns `false`, leaving the identity index untouched. If the
    /// *identity* is already registered under a different span, the old
    /// interval is replaced by the new one, so moving an object only takes
    /// one call.
    pub fn add(&mut self, interval: Interval<T, I, D>) -> bool {
        if find_span(&self.root, interval.start, interval.end).is_some() {
            return false;
        }
        if let Some((start, end)) = self.spans.get(&interval.id).copied() {
            self.remove(start, end);
        }
        let id = interval.id.clone();
        let span = interval.span();
        let node = Box::new(Node::new(interval));
        self.root = Some(match self.root.take() {
            Some(root) => insert(root, node),
            None => node,
        });
        self.spans.insert(id, span);
        true
    }

    /// Removes the interval spanning exactly `start..=end`.
    ///
    /// Returns whether an interval was removed. The tree is rebalanced on the
    /// way back up, so later queries keep their logarithmic bound.
    pub fn remove(&mut self, start: T, end: T) -> bool {
        let mut removed = None;
        self.root = remove_span(self.root.take(), start, end, &mut removed);
        match removed {
            Some(id) => {
                self.spans.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Removes the interval registered under `id`, wherever it currently lies.
    ///
    /// Returns whether an interval was removed.
    pub fn remove_by_id(&mut self, id: &I) -> bool {
        let Some((start, end)) = self.spans.get(id).copied() else {
            return false;
        };
        self.remove(start, end)
    }

    /// The interval registered under `id`, if any.
    #[must_use]
    pub fn get(&self, id: &I) -> Option<&Interval<T, I, D>> {
        let (start, end) = self.spans.get(id).copied()?;
        find_span(&self.root, start, end)
    }

    /// Whether any stored interval covers `point`, endpoints included.
    #[must_use]
    pub fn contains(&self, point: T) -> bool {
        contains_point(&self.root, point)
    }

    /// All intervals overlapping `start..=end`, endpoints included.
    ///
    /// The result order follows the traversal, not the interval order.
    ///
    /// # Panics
    ///
    /// Panics if `start` and `end` are out of order or incomparable.
    #[must_use]
    pub fn search(&self, start: T, end: T) -> Vec<&Interval<T, I, D>> {
        assert!(le(start, end), "malformed query: start must not exceed end");
        let mut hits = Vec::new();
        search_overlaps(&self.root, start, end, &mut hits);
        hits
    }

    /// Some interval overlapping `start..=end`, or `None`.
    ///
    /// Stops at the first overlap found, so this is cheaper than
    /// [`search`](Self::search) when any witness will do.
    ///
    /// # Panics
    ///
    /// Panics if `start` and `end` are out of order or incomparable.
    #[must_use]
    pub fn search_single(&self, start: T, end: T) -> Option<&Interval<T, I, D>> {
        assert!(le(start, end), "malformed query: start must not exceed end");
        search_first(&self.root, start, end)
    }

    /// Iterates the stored intervals in ascending start order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval<T, I, D>> {
        let mut stack = Vec::new();
        let mut cursor = self.root.as_deref();
        core::iter::from_fn(move || {
            while let Some(node) = cursor {
                stack.push(node);
                cursor = node.left.as_deref();
            }
            let node = stack.pop()?;
            cursor = node.right.as_deref();
            Some(&node.interval)
        })
    }

    /// Drops every interval.
    pub fn clear(&mut self) {
        self.root = None;
        self.spans.clear();
    }
}

impl<T, I, D> Default for IntervalTree<T, I, D>
where
    T: Copy + PartialOrd,
    I: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I, D> FromIterator<Interval<T, I, D>> for IntervalTree<T, I, D>
where
    T: Copy + PartialOrd,
    I: Clone + Eq + Hash,
{
    fn from_iter<It: IntoIterator<Item = Interval<T, I, D>>>(iter: It) -> Self {
        let mut tree = Self::new();
        for interval in iter {
            tree.add(interval);
        }
        tree
    }
}

impl<T, I, D> fmt::Debug for IntervalTree<T, I, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let height = self.root.as_deref().map_or(0, |node| node.height);
        f.debug_struct("IntervalTree")
            .field("len", &self.spans.len())
            .field("height", &height)
            .finish_non_exhaustive()
    }
}

fn insert<T, I, D>(mut root: Box<Node<T, I, D>>, node: Box<Node<T, I, D>>) -> Box<Node<T, I, D>>
where
    T: Copy + PartialOrd,
{
    if le(node.interval.start, root.interval.start) {
        root.left = Some(match root.left.take() {
            Some(left) => insert(left, node),
            None => node,
        });
    } else {
        root.right = Some(match root.right.take() {
            Some(right) => insert(right, node),
            None => node,
        });
    }
    rebalance(root)
}

fn remove_span<T, I, D>(
    link: Link<T, I, D>,
    start: T,
    end: T,
    removed: &mut Option<I>,
) -> Link<T, I, D>
where
    T: Copy + PartialOrd,
{
    let Some(mut node) = link else {
        return None;
    };
    // Nothing below this node ends late enough to match the span.
    if lt(node.max_end, end) {
        return Some(node);
    }
    if node.interval.start == start && node.interval.end == end {
        let Node {
            interval,
            left,
            right,
            ..
        } = *node;
        *removed = Some(interval.id);
        return match (left, right) {
            (None, right) => right,
            (left, None) => left,
            (Some(left), Some(right)) => {
                let (mut successor, rest) = detach_leftmost(right);
                successor.left = Some(left);
                successor.right = rest;
                Some(rebalance(successor))
            }
        };
    }
    // Equal starts can rotate to either side, so search both subtrees.
    node.left = remove_span(node.left.take(), start, end, removed);
    if removed.is_none() {
        node.right = remove_span(node.right.take(), start, end, removed);
    }
    Some(rebalance(node))
}

/// Unlinks the leftmost node of `node`'s subtree, returning it along with the
/// rebalanced remainder.
fn detach_leftmost<T, I, D>(mut node: Box<Node<T, I, D>>) -> (Box<Node<T, I, D>>, Link<T, I, D>)
where
    T: Copy + PartialOrd,
{
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (node, rest)
        }
        Some(left) => {
            let (leftmost, remainder) = detach_leftmost(left);
            node.left = remainder;
            (leftmost, Some(rebalance(node)))
        }
    }
}

/// Restores the AVL balance at `node` after a child subtree changed height.
fn rebalance<T, I, D>(mut node: Box<Node<T, I, D>>) -> Box<Node<T, I, D>>
where
    T: Copy + PartialOrd,
{
    node.refresh();
    let balance = node.balance();
    if balance > 1 {
        if node.left.as_deref().is_some_and(|left| left.balance() < 0) {
            let left = node.left.take().expect("left-heavy node without a left child");
            node.left = Some(rotate_left(left));
        }
        rotate_right(node)
    } else if balance < -1 {
        if node.right.as_deref().is_some_and(|right| right.balance() > 0) {
            let right = node
                .right
                .take()
                .expect("right-heavy node without a right child");
            node.right = Some(rotate_right(right));
        }
        rotate_left(node)
    } else {
        node
    }
}

fn rotate_left<T, I, D>(mut node: Box<Node<T, I, D>>) -> Box<Node<T, I, D>>
where
    T: Copy + PartialOrd,
{
    let mut pivot = node.right.take().expect("rotate_left requires a right child");
    node.right = pivot.left.take();
    node.refresh();
    pivot.left = Some(node);
    pivot.refresh();
    pivot
}

fn rotate_right<T, I, D>(mut node: Box<Node<T, I, D>>) -> Box<Node<T, I, D>>
where
    T: Copy + PartialOrd,
{
    let mut pivot = node.left.take().expect("rotate_right requires a left child");
    node.left = pivot.right.take();
    node.refresh();
    pivot.right = Some(node);
    pivot.refresh();
    pivot
}

fn find_span<'t, T, I, D>(link: &'t Link<T, I, D>, start: T, end: T) -> Option<&'t Interval<T, I, D>>
where
    T: Copy + PartialOrd,
{
    let node = link.as_deref()?;
    if lt(node.max_end, end) {
        return None;
    }
    if node.interval.start == start && node.interval.end == end {
        return Some(&node.interval);
    }
    find_span(&node.left, start, end).or_else(|| find_span(&node.right, start, end))
}

fn contains_point<T, I, D>(link: &Link<T, I, D>, point: T) -> bool
where
    T: Copy + PartialOrd,
{
    let Some(node) = link.as_deref() else {
        return false;
    };
    // Every interval below ends before the point.
    if lt(node.max_end, point) {
        return false;
    }
    if le(node.interval.start, point) && ge(node.interval.end, point) {
        return true;
    }
    contains_point(&node.left, point) || contains_point(&node.right, point)
}

fn search_overlaps<'t, T, I, D>(
    link: &'t Link<T, I, D>,
    start: T,
    end: T,
    hits: &mut Vec<&'t Interval<T, I, D>>,
) where
    T: Copy + PartialOrd,
{
    let Some(node) = link.as_deref() else {
        return;
    };
    if lt(node.max_end, start) {
        return;
    }
    if node.interval.overlaps(start, end) {
        hits.push(&node.interval);
    }
    search_overlaps(&node.left, start, end, hits);
    search_overlaps(&node.right, start, end, hits);
}

fn search_first<'t, T, I, D>(
    link: &'t Link<T, I, D>,
    start: T,
    end: T,
) -> Option<&'t Interval<T, I, D>>
where
    T: Copy + PartialOrd,
{
    let node = link.as_deref()?;
    if lt(node.max_end, start) {
        return None;
    }
    if node.interval.overlaps(start, end) {
        return Some(&node.interval);
    }
    search_first(&node.left, start, end).or_else(|| search_first(&node.right, start, end))
}

#[cfg(test)]
mod tests {
    use core::fmt::Debug;

    use super::*;

    /// Walks the tree recomputing every augment and checking the AVL balance.
    fn audit<T, I, D>(link: &Link<T, I, D>) -> (u32, Option<T>)
    where
        T: Copy + PartialOrd + Debug,
    {
        let Some(node) = link.as_deref() else {
            return (0, None);
        };
        let (left_height, left_max) = audit(&node.left);
        let (right_height, right_max) = audit(&node.right);
        let height = 1 + left_height.max(right_height);
        assert_eq!(node.height, height, "stored height must match the subtree");
        let mut max_end = node.interval.end;
        if let Some(end) = left_max {
            max_end = max_of(max_end, end);
        }
        if let Some(end) = right_max {
            max_end = max_of(max_end, end);
        }
        assert_eq!(node.max_end, max_end, "stored max_end must match the subtree");
        let spread = i64::from(left_height) - i64::from(right_height);
        assert!(spread.abs() <= 1, "AVL balance must stay within one");
        (height, Some(max_end))
    }

    fn rows() -> IntervalTree<f64, &'static str, ()> {
        let mut tree = IntervalTree::new();
        tree.add(Interval::new("a", 0.0, 120.0, ()));
        tree.add(Interval::new("b", 100.0, 180.0, ()));
        tree.add(Interval::new("c", 300.0, 420.0, ()));
        tree
    }

    fn hit_ids(hits: &[&Interval<f64, &'static str, ()>]) -> Vec<&'static str> {
        let mut ids: Vec<_> = hits.iter().map(|interval| interval.id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn empty_tree_matches_nothing() {
        let tree: IntervalTree<f64, u32, ()> = IntervalTree::new();
        assert!(tree.is_empty(), "fresh tree is empty");
        assert_eq!(tree.len(), 0, "fresh tree has no intervals");
        assert_eq!(tree.height(), 0, "fresh tree has height zero");
        assert!(!tree.contains(0.0), "no interval covers any point");
        assert!(tree.search(0.0, 10.0).is_empty(), "no overlaps in an empty tree");
        assert!(tree.search_single(0.0, 10.0).is_none(), "no witness in an empty tree");
    }

    #[test]
    fn overlap_queries_are_inclusive() {
        let tree = rows();
        assert_eq!(hit_ids(&tree.search(90.0, 130.0)), ["a", "b"], "band touches two rows");
        assert_eq!(hit_ids(&tree.search(120.0, 120.0)), ["a", "b"], "touching endpoints count");
        assert_eq!(hit_ids(&tree.search(181.0, 299.0)), Vec::<&str>::new(), "gap matches nothing");
        assert!(tree.contains(0.0), "start endpoint is covered");
        assert!(tree.contains(420.0), "end endpoint is covered");
        assert!(!tree.contains(200.0), "gap point is not covered");
    }

    #[test]
    fn search_single_finds_a_witness() {
        let tree = rows();
        let witness = tree.search_single(150.0, 350.0);
        assert!(
            witness.is_some_and(|interval| interval.id == "b" || interval.id == "c"),
            "witness must be one of the overlapping rows"
        );
        assert!(tree.search_single(200.0, 250.0).is_none(), "gap yields no witness");
    }

    #[test]
    fn duplicate_span_is_rejected() {
        let mut tree = rows();
        assert!(!tree.add(Interval::new("d", 0.0, 120.0, ())), "span already present");
        assert_eq!(tree.len(), 3, "rejected insert does not grow the tree");
        assert!(tree.get(&"d").is_none(), "rejected identity is not registered");
    }

    #[test]
    fn same_identity_moves_the_interval() {
        let mut tree = rows();
        assert!(tree.add(Interval::new("b", 500.0, 560.0, ())), "re-register under a new span");
        assert_eq!(tree.len(), 3, "moving does not change the count");
        assert_eq!(
            tree.get(&"b").map(Interval::span),
            Some((500.0, 560.0)),
            "identity resolves to the new span"
        );
        assert!(tree.search(150.0, 200.0).is_empty(), "old span is gone");
        audit(&tree.root);
    }

    #[test]
    fn remove_by_span() {
        let mut tree = rows();
        assert!(tree.remove(100.0, 180.0), "existing span is removed");
        assert!(!tree.remove(100.0, 180.0), "second removal finds nothing");
        assert!(!tree.remove(0.0, 119.0), "near-miss span does not match");
        assert_eq!(tree.len(), 2, "one interval left the tree");
        assert!(!tree.contains(150.0), "removed interval no longer matches");
        audit(&tree.root);
    }

    #[test]
    fn remove_by_id_is_permanent() {
        let mut tree = rows();
        assert!(tree.remove_by_id(&"b"), "registered identity is removed");
        assert!(!tree.remove_by_id(&"b"), "identity cannot be removed twice");
        assert!(
            !hit_ids(&tree.search(-1000.0, 1000.0)).contains(&"b"),
            "removed identity never matches again"
        );
        assert!(tree.get(&"b").is_none(), "removed identity does not resolve");
    }

    #[test]
    fn negative_endpoints() {
        let mut tree = IntervalTree::new();
        tree.add(Interval::new(1_u32, -40.0, -25.0, ()));
        tree.add(Interval::new(2_u32, -10.0, -2.0, ()));
        assert!(tree.contains(-30.0), "negative point inside the first interval");
        assert!(!tree.contains(-20.0), "gap between negative intervals");
        assert_eq!(tree.search(-5.0, 0.0).len(), 1, "query straddling zero finds one");
        audit(&tree.root);
    }

    #[test]
    fn point_intervals() {
        let mut tree = IntervalTree::new();
        tree.add(Interval::point("tick", 7.5, ()));
        assert!(tree.contains(7.5), "degenerate interval covers its point");
        assert_eq!(tree.search(7.5, 7.5).len(), 1, "degenerate query touches it");
        assert!(tree.search(7.6, 8.0).is_empty(), "just past the point misses");
    }

    #[test]
    fn payload_rides_along() {
        let mut tree = IntervalTree::new();
        tree.add(Interval::new(9_u32, 10.0, 20.0, "snap-guide"));
        assert_eq!(
            tree.get(&9).map(|interval| interval.data),
            Some("snap-guide"),
            "payload comes back with the interval"
        );
    }

    #[test]
    fn stays_balanced_through_sequential_inserts() {
        let mut tree = IntervalTree::new();
        for i in 0..128_u32 {
            let start = f64::from(i) * 10.0;
            tree.add(Interval::new(i, start, start + 5.0, ()));
        }
        assert_eq!(tree.len(), 128, "every interval was stored");
        audit(&tree.root);
        assert!(tree.height() <= 9, "ascending inserts must not degenerate");
    }

    #[test]
    fn rebalances_after_removals() {
        let mut tree = IntervalTree::new();
        for i in 0..128_u32 {
            let start = f64::from(i) * 10.0;
            tree.add(Interval::new(i, start, start + 5.0, ()));
        }
        for i in (0..128_u32).step_by(2) {
            let start = f64::from(i) * 10.0;
            assert!(tree.remove(start, start + 5.0), "even interval is removed");
        }
        assert_eq!(tree.len(), 64, "half the intervals remain");
        audit(&tree.root);
        assert!(!tree.contains(0.0), "removed interval is gone");
        assert!(tree.contains(12.0), "odd interval survives");
    }

    #[test]
    fn matches_brute_force_overlaps() {
        let mut tree = IntervalTree::new();
        let mut mirror = Vec::new();
        for i in 0..200_u32 {
            let start = f64::from((i * 83) % 400) - 100.0;
            let end = start + f64::from((i * 29) % 60);
            if tree.add(Interval::new(i, start, end, ())) {
                mirror.push((i, start, end));
            }
        }
        audit(&tree.root);
        for q in 0..50_u32 {
            let start = f64::from((q * 53) % 500) - 150.0;
            let end = start + f64::from((q * 13) % 80);
            let mut got: Vec<u32> = tree.search(start, end).iter().map(|hit| hit.id).collect();
            got.sort_unstable();
            let mut want: Vec<u32> = mirror
                .iter()
                .filter(|&&(_, s, e)| s <= end && start <= e)
                .map(|&(id, _, _)| id)
                .collect();
            want.sort_unstable();
            assert_eq!(got, want, "tree search must agree with the linear scan");
        }
    }

    #[test]
    fn iterates_in_start_order() {
        let mut tree = IntervalTree::new();
        for i in [40_u32, 7, 99, 3, 62, 15] {
            let start = f64::from(i);
            tree.add(Interval::new(i, start, start + 1.0, ()));
        }
        let starts: Vec<f64> = tree.iter().map(|interval| interval.start).collect();
        assert!(
            starts.windows(2).all(|pair| pair[0] <= pair[1]),
            "iteration must be sorted by start"
        );
        assert_eq!(starts.len(), 6, "iteration visits every interval");
    }

    #[test]
    fn clear_resets_everything() {
        let mut tree = rows();
        tree.clear();
        assert!(tree.is_empty(), "cleared tree is empty");
        assert_eq!(tree.len(), 0, "cleared tree has no identities");
        assert!(!tree.contains(50.0), "cleared tree covers nothing");
        assert!(tree.add(Interval::new("a", 0.0, 1.0, ())), "cleared tree accepts inserts");
    }

    #[test]
    fn collects_from_iterator() {
        let tree: IntervalTree<f64, u32, ()> = (0..10_u32)
            .map(|i| Interval::new(i, f64::from(i), f64::from(i) + 0.5, ()))
            .collect();
        assert_eq!(tree.len(), 10, "every interval collected");
        audit(&tree.root);
    }

    #[test]
    #[should_panic(expected = "malformed interval")]
    fn rejects_backwards_spans() {
        let _ = Interval::new((), 5.0, 1.0, ());
    }
}
