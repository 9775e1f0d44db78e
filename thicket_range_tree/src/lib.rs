// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=thicket_range_tree --heading-base-level=0

//! Thicket Range Tree: an ordered key → bucket index with range queries.
//!
//! The tree is a left-leaning red-black BST (the 2-3 variant described in
//! Sedgewick & Wayne's *Algorithms*) keyed by an ordered scalar. Each
//! distinct key owns one node holding an ordered bucket of values, so
//! repeated inserts at the same key append to the bucket instead of growing
//! the tree. This is the shape a canvas engine wants for key-ordered layer
//! and position indexes: many objects share a coordinate, and queries ask
//! for "everything between these two keys" in key order.
//!
//! - [`RangeTree::insert`] appends `value` to the bucket at `key`.
//! - [`RangeTree::remove`] deletes matching values from the bucket and only
//!   removes the node itself once its bucket empties.
//! - [`RangeTree::range_query`] walks the tree in order, pruned to
//!   `[from, to]`.
//!
//! Balance is restored after every structural change, so the height stays
//! within `2 * log2(n + 1)` for `n` keys.
//!
//! # Example
//!
//! ```rust
//! use thicket_range_tree::RangeTree;
//!
//! let mut positions: RangeTree<f64, &str> = RangeTree::new();
//! positions.insert(10.0, "rect-a");
//! positions.insert(10.0, "rect-b");
//! positions.insert(25.0, "ellipse");
//! positions.insert(40.0, "text");
//!
//! assert_eq!(positions.get(10.0), Some(&["rect-a", "rect-b"][..]));
//!
//! let hits = positions.range_query(5.0, 30.0);
//! let keys: Vec<f64> = hits.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, [10.0, 25.0]);
//!
//! positions.remove(10.0, &"rect-a");
//! positions.remove(10.0, &"rect-b"); // bucket empties, node goes away
//! assert_eq!(positions.get(10.0), None);
//! ```
//!
//! ### Key semantics
//!
//! Keys only need [`PartialOrd`]; incomparable pairs (NaN) are treated as
//! equal, so the tree assumes callers never feed NaN keys.

#![no_std]

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

use smallvec::SmallVec;

/// Per-key value storage. Most keys in practice hold a handful of values.
type Bucket<V> = SmallVec<[V; 4]>;

type Link<K, V> = Option<Box<Node<K, V>>>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

impl Color {
    fn flip(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    bucket: Bucket<V>,
    color: Color,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Fresh nodes enter the tree red, as 2-3 insertion demands.
    fn new(key: K, value: V) -> Self {
        let mut bucket = Bucket::new();
        bucket.push(value);
        Self {
            key,
            bucket,
            color: Color::Red,
            left: None,
            right: None,
        }
    }
}

/// An ordered map from keys to buckets of values, balanced as an LLRB tree.
///
/// See the [crate docs](crate) for the overall model and an example.
pub struct RangeTree<K, V> {
    root: Link<K, V>,
    keys: usize,
}

impl<K, V> Default for RangeTree<K, V>
where
    K: Copy + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RangeTree<K, V>
where
    K: Copy + PartialOrd,
{
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self { root: None, keys: 0 }
    }

    /// The number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys
    }

    /// Whether the tree holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Appends `value` to the bucket at `key`, creating the node on first use.
    pub fn insert(&mut self, key: K, value: V) {
        if self.get(key).is_none() {
            self.keys += 1;
        }
        let mut root = insert_rec(self.root.take(), key, value);
        root.color = Color::Black;
        self.root = Some(root);
    }

    /// Removes every bucket entry at `key` equal to `value`.
    ///
    /// Once the bucket empties the node itself is deleted and the tree is
    /// rebalanced. Removing from an absent key, or a value that is not in
    /// the bucket, is a no-op.
    pub fn remove(&mut self, key: K, value: &V)
    where
        V: PartialEq,
    {
        if self.root.is_none() {
            return;
        }

        remove_value_rec(&mut self.root, key, value);

        let emptied = self.get(key).is_some_and(<[V]>::is_empty);
        if emptied {
            if let Some(root) = self.root.as_deref_mut()
                && !is_red(&root.left)
                && !is_red(&root.right)
            {
                root.color = Color::Red;
            }
            self.root = self.root.take().and_then(|root| remove_node_rec(root, key));
            if let Some(root) = self.root.as_deref_mut() {
                root.color = Color::Black;
            }
            self.keys -= 1;
        }
    }

    /// Replaces every bucket entry at `key` equal to `old` with `new`.
    pub fn update(&mut self, key: K, old: &V, new: V)
    where
        V: PartialEq + Clone,
    {
        let mut cursor = self.root.as_deref_mut();
        while let Some(node) = cursor {
            match cmp_key(key, node.key) {
                Ordering::Equal => {
                    for slot in &mut node.bucket {
                        if slot == old {
                            *slot = new.clone();
                        }
                    }
                    return;
                }
                Ordering::Less => cursor = node.left.as_deref_mut(),
                Ordering::Greater => cursor = node.right.as_deref_mut(),
            }
        }
    }

    /// The bucket stored at `key`, in insertion order.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&[V]> {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            match cmp_key(key, node.key) {
                Ordering::Equal => return Some(&node.bucket),
                Ordering::Less => cursor = node.left.as_deref(),
                Ordering::Greater => cursor = node.right.as_deref(),
            }
        }
        None
    }

    /// Every `(key, bucket)` pair with `from <= key <= to`, in key order.
    ///
    /// The traversal only descends into subtrees that can intersect the
    /// range, so this is O(log n + m) for m reported keys.
    #[must_use]
    pub fn range_query(&self, from: K, to: K) -> Vec<(K, &[V])> {
        let mut out = Vec::new();
        range_query_rec(&self.root, from, to, &mut out);
        out
    }

    /// Iterates every `(key, bucket)` pair in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &[V])> {
        let mut stack: Vec<&Node<K, V>> = Vec::new();
        let mut cursor = self.root.as_deref();
        core::iter::from_fn(move || {
            while let Some(node) = cursor {
                stack.push(node);
                cursor = node.left.as_deref();
            }
            let node = stack.pop()?;
            cursor = node.right.as_deref();
            Some((node.key, &node.bucket[..]))
        })
    }

    /// Height of the tree in nodes (an empty tree has height 0).
    #[must_use]
    pub fn height(&self) -> usize {
        height_rec(&self.root)
    }

    /// An ordered snapshot of the whole tree as `(key, bucket)` pairs.
    #[must_use]
    pub fn as_map(&self) -> Vec<(K, Vec<V>)>
    where
        V: Clone,
    {
        self.iter().map(|(key, bucket)| (key, bucket.to_vec())).collect()
    }
}

impl<K: fmt::Debug, V> fmt::Debug for RangeTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = 0_usize;
        let mut values = 0_usize;
        let mut stack: Vec<&Node<K, V>> = self.root.as_deref().into_iter().collect();
        while let Some(node) = stack.pop() {
            keys += 1;
            values += node.bucket.len();
            stack.extend(node.left.as_deref());
            stack.extend(node.right.as_deref());
        }
        f.debug_struct("RangeTree")
            .field("keys", &keys)
            .field("values", &values)
            .finish_non_exhaustive()
    }
}

/// Key comparison; incomparable pairs (NaN) collapse to `Equal`.
fn cmp_key<K: PartialOrd>(a: K, b: K) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn is_red<K, V>(link: &Link<K, V>) -> bool {
    matches!(link.as_deref(), Some(node) if node.color == Color::Red)
}

/// Whether `node.left.left` is red, tolerating missing children.
fn left_left_red<K, V>(node: &Node<K, V>) -> bool {
    node.left.as_deref().is_some_and(|left| is_red(&left.left))
}

fn insert_rec<K, V>(link: Link<K, V>, key: K, value: V) -> Box<Node<K, V>>
where
    K: Copy + PartialOrd,
{
    let Some(mut node) = link else {
        return Box::new(Node::new(key, value));
    };
    match cmp_key(key, node.key) {
        Ordering::Equal => node.bucket.push(value),
        Ordering::Less => node.left = Some(insert_rec(node.left.take(), key, value)),
        Ordering::Greater => node.right = Some(insert_rec(node.right.take(), key, value)),
    }

    // LLRB fix-up: lean left, then resolve two reds on the left spine, then
    // split the temporary 4-node.
    if is_red(&node.right) && !is_red(&node.left) {
        node = rotate_left(node);
    }
    if is_red(&node.left) && left_left_red(&node) {
        node = rotate_right(node);
    }
    if is_red(&node.left) && is_red(&node.right) {
        flip_colors(&mut node);
    }
    node
}

/// Deletes matching values from the bucket at `key`, leaving the node in
/// place even when the bucket empties; the caller removes empty nodes.
fn remove_value_rec<K, V>(link: &mut Link<K, V>, key: K, value: &V)
where
    K: Copy + PartialOrd,
    V: PartialEq,
{
    let Some(node) = link.as_deref_mut() else {
        return;
    };
    match cmp_key(key, node.key) {
        Ordering::Equal => node.bucket.retain(|it| *it != *value),
        Ordering::Less => remove_value_rec(&mut node.left, key, value),
        Ordering::Greater => remove_value_rec(&mut node.right, key, value),
    }
}

/// Classic LLRB delete; assumes `key` is present somewhere below `node`.
fn remove_node_rec<K, V>(mut node: Box<Node<K, V>>, key: K) -> Link<K, V>
where
    K: Copy + PartialOrd,
{
    if cmp_key(key, node.key) == Ordering::Less {
        if !is_red(&node.left) && !left_left_red(&node) {
            node = move_red_left(node);
        }
        node.left = node.left.take().and_then(|left| remove_node_rec(left, key));
    } else {
        if is_red(&node.left) {
            node = rotate_right(node);
        }
        if cmp_key(key, node.key) == Ordering::Equal && node.right.is_none() {
            return None;
        }
        let right_left_red = node.right.as_deref().is_some_and(|right| is_red(&right.left));
        if !is_red(&node.right) && !right_left_red {
            node = move_red_right(node);
        }
        if cmp_key(key, node.key) == Ordering::Equal {
            // Promote the in-order successor into this node.
            if let Some(right) = node.right.take() {
                let (rest, (succ_key, succ_bucket)) = remove_min_rec(right);
                node.key = succ_key;
                node.bucket = succ_bucket;
                node.right = rest;
            }
        } else {
            node.right = node
                .right
                .take()
                .and_then(|right| remove_node_rec(right, key));
        }
    }
    Some(balance(node))
}

/// Detaches the leftmost node below `node`, returning the rebalanced
/// remainder together with the detached key and bucket.
fn remove_min_rec<K, V>(mut node: Box<Node<K, V>>) -> (Link<K, V>, (K, Bucket<V>)) {
    if node.left.is_some() && !is_red(&node.left) && !left_left_red(&node) {
        node = move_red_left(node);
    }
    match node.left.take() {
        None => {
            let Node { key, bucket, .. } = *node;
            (None, (key, bucket))
        }
        Some(left) => {
            let (rest, min) = remove_min_rec(left);
            node.left = rest;
            (Some(balance(node)), min)
        }
    }
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let mut x = node.right.take().expect("rotate_left requires a right child");
    node.right = x.left.take();
    x.color = node.color;
    node.color = Color::Red;
    x.left = Some(node);
    x
}

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let mut x = node.left.take().expect("rotate_right requires a left child");
    node.left = x.right.take();
    x.color = node.color;
    node.color = Color::Red;
    x.right = Some(node);
    x
}

fn flip_colors<K, V>(node: &mut Node<K, V>) {
    node.color = node.color.flip();
    if let Some(left) = node.left.as_deref_mut() {
        left.color = left.color.flip();
    }
    if let Some(right) = node.right.as_deref_mut() {
        right.color = right.color.flip();
    }
}

/// Post-delete fix-up: identical to the insert fix-up, but the left-lean
/// rotation applies whenever the right child is red.
fn balance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    if is_red(&node.right) {
        node = rotate_left(node);
    }
    if is_red(&node.left) && left_left_red(&node) {
        node = rotate_right(node);
    }
    if is_red(&node.left) && is_red(&node.right) {
        flip_colors(&mut node);
    }
    node
}

/// Borrows a red link from the right sibling so the left descent can remove.
fn move_red_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    flip_colors(&mut node);
    let right_left_red = node.right.as_deref().is_some_and(|right| is_red(&right.left));
    if right_left_red {
        if let Some(right) = node.right.take() {
            node.right = Some(rotate_right(right));
        }
        node = rotate_left(node);
        flip_colors(&mut node);
    }
    node
}

/// Borrows a red link from the left sibling so the right descent can remove.
fn move_red_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
    flip_colors(&mut node);
    if left_left_red(&node) {
        node = rotate_right(node);
        flip_colors(&mut node);
    }
    node
}

fn range_query_rec<'t, K, V>(link: &'t Link<K, V>, from: K, to: K, out: &mut Vec<(K, &'t [V])>)
where
    K: Copy + PartialOrd,
{
    let Some(node) = link.as_deref() else {
        return;
    };
    if cmp_key(from, node.key) == Ordering::Less {
        range_query_rec(&node.left, from, to, out);
    }
    if cmp_key(from, node.key) != Ordering::Greater && cmp_key(to, node.key) != Ordering::Less {
        out.push((node.key, &node.bucket));
    }
    if cmp_key(to, node.key) == Ordering::Greater {
        range_query_rec(&node.right, from, to, out);
    }
}

fn height_rec<K, V>(link: &Link<K, V>) -> usize {
    link.as_deref()
        .map_or(0, |node| 1 + height_rec(&node.left).max(height_rec(&node.right)))
}
