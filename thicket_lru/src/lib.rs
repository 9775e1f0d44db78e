// Copyright 2025 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket LRU: a capacity-bounded least-recently-used cache.
//!
//! The cache pairs a `hashbrown` map (key → slot) with a doubly linked
//! recency list threaded through a slot arena, so every operation is O(1):
//!
//! - [`LruCache::get`] returns the value and marks the entry most recent.
//! - [`LruCache::set`] updates in place, or evicts the least recently used
//!   entry when a new key arrives at capacity.
//! - [`LruCache::remove`] detaches an entry and returns its value.
//!
//! Recency is only disturbed by `get` and `set`; [`LruCache::peek`] reads
//! without promoting.
//!
//! # Example
//!
//! ```rust
//! use thicket_lru::LruCache;
//!
//! let mut cache = LruCache::new(2);
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get(&"a");
//! cache.set("c", 3); // evicts "b", the least recently touched key
//!
//! assert_eq!(cache.get(&"b"), None);
//! assert_eq!(cache.get(&"a"), Some(&1));
//! assert_eq!(cache.get(&"c"), Some(&3));
//! ```

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

struct Entry<K, V> {
    key: K,
    value: V,
    /// Toward the head (more recent).
    prev: Option<usize>,
    /// Toward the tail (less recent).
    next: Option<usize>,
}

/// A least-recently-used cache holding at most `limit` entries.
///
/// Entries live in a slot arena; the recency list links slots by index, and
/// freed slots are recycled, so a cache at steady state allocates nothing.
pub struct LruCache<K, V> {
    limit: usize,
    map: HashMap<K, usize>,
    entries: Vec<Option<Entry<K, V>>>,
    free_list: Vec<usize>,
    /// Most recently used slot.
    head: Option<usize>,
    /// Least recently used slot; evicted first.
    tail: Option<usize>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache that holds at most `limit` entries.
    ///
    /// A `limit` of zero yields a cache that never stores anything; `set`
    /// becomes a no-op.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            map: HashMap::new(),
            entries: Vec::new(),
            free_list: Vec::new(),
            head: None,
            tail: None,
        }
    }

    /// The configured capacity.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether `key` is present, without touching recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns the value for `key` and marks the entry most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&self.entry(idx).value)
    }

    /// Returns the value for `key` without touching recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        Some(&self.entry(idx).value)
    }

    /// Inserts or updates `key`, making it the most recently used entry.
    ///
    /// When `key` is already present its value is replaced in place. When a
    /// new key arrives with the cache at capacity, the least recently used
    /// entry is evicted first.
    pub fn set(&mut self, key: K, value: V) {
        if self.limit == 0 {
            return;
        }
        if let Some(&idx) = self.map.get(&key) {
            self.entry_mut(idx).value = value;
            self.touch(idx);
            return;
        }
        if self.map.len() >= self.limit {
            self.evict_tail();
        }
        let idx = self.alloc(Entry {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.attach_head(idx);
        self.map.insert(key, idx);
    }

    /// Removes `key`, returning its value when it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.detach(idx);
        let entry = self.entries[idx].take().expect("dangling recency slot");
        self.free_list.push(idx);
        Some(entry.value)
    }

    /// Drops every entry, keeping allocations for reuse.
    pub fn clear(&mut self) {
        self.map.clear();
        self.entries.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        core::iter::successors(self.head, |&idx| self.entry(idx).next).map(|idx| {
            let entry = self.entry(idx);
            (&entry.key, &entry.value)
        })
    }

    fn entry(&self, idx: usize) -> &Entry<K, V> {
        self.entries[idx].as_ref().expect("dangling recency slot")
    }

    fn entry_mut(&mut self, idx: usize) -> &mut Entry<K, V> {
        self.entries[idx].as_mut().expect("dangling recency slot")
    }

    fn alloc(&mut self, entry: Entry<K, V>) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.entries[idx] = Some(entry);
            idx
        } else {
            self.entries.push(Some(entry));
            self.entries.len() - 1
        }
    }

    /// Unlinks `idx` from the recency list, leaving its slot allocated.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let entry = self.entry(idx);
            (entry.prev, entry.next)
        };
        match prev {
            Some(p) => self.entry_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entry_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let entry = self.entry_mut(idx);
        entry.prev = None;
        entry.next = None;
    }

    /// Links `idx` in as the new head (most recent).
    fn attach_head(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let entry = self.entry_mut(idx);
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(h) => self.entry_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_head(idx);
    }

    fn evict_tail(&mut self) {
        let Some(tail) = self.tail else {
            return;
        };
        self.detach(tail);
        let entry = self.entries[tail].take().expect("dangling recency slot");
        self.map.remove(&entry.key);
        self.free_list.push(tail);
    }
}

impl<K: fmt::Debug, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alive = self.entries.iter().filter(|e| e.is_some()).count();
        f.debug_struct("LruCache")
            .field("limit", &self.limit)
            .field("len", &alive)
            .field("slots_total", &self.entries.len())
            .finish_non_exhaustive()
    }
}
