// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Bounded LRU cache for query results.
//!
//! A doubly-linked recency list threaded through a slab of nodes, plus a map
//! from key to slab slot. Head is the least recently used entry, tail the
//! most recent; `get` and `insert` both promote to the tail, and inserting
//! over capacity evicts the head. Every move is a handful of index swaps —
//! O(1), no allocation after the slab warms up.
//!
//! All operations serialize under a single `parking_lot::Mutex`. Query
//! results are small index vectors, so the critical section is a clone and
//! a few pointer updates; contention is not a concern at the call rates an
//! in-memory index sees.
//!
//! Construction never fails: a capacity of zero is coerced to one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

const NIL: usize = usize::MAX;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

struct Inner<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    free: Vec<usize>,
    /// Least recently used slot.
    head: usize,
    /// Most recently used slot.
    tail: usize,
}

impl<K: Eq + Hash + Clone, V: Clone> Inner<K, V> {
    /// Unlink a slot from the recency list.
    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
    }

    /// Link a slot at the tail (most recently used).
    fn attach_tail(&mut self, slot: usize) {
        self.nodes[slot].prev = self.tail;
        self.nodes[slot].next = NIL;
        if self.tail == NIL {
            self.head = slot;
        } else {
            self.nodes[self.tail].next = slot;
        }
        self.tail = slot;
    }

    fn promote(&mut self, slot: usize) {
        if self.tail != slot {
            self.detach(slot);
            self.attach_tail(slot);
        }
    }

    fn evict_head(&mut self) {
        let slot = self.head;
        if slot == NIL {
            return;
        }
        self.detach(slot);
        self.map.remove(&self.nodes[slot].key);
        self.free.push(slot);
    }
}

/// Thread-safe LRU cache with recency promotion on both reads and writes.
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries (coerced to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                capacity,
                map: HashMap::with_capacity(capacity),
                nodes: Vec::with_capacity(capacity),
                free: Vec::new(),
                head: NIL,
                tail: NIL,
            }),
        }
    }

    /// Look up a key, promoting it to most recently used on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let slot = *inner.map.get(key)?;
        inner.promote(slot);
        Some(inner.nodes[slot].value.clone())
    }

    /// Insert or update a key, promoting it and evicting the LRU entry when
    /// the cache grows past capacity.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        if let Some(&slot) = inner.map.get(&key) {
            inner.nodes[slot].value = value;
            inner.promote(slot);
            return;
        }

        if inner.map.len() >= inner.capacity {
            inner.evict_head();
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let slot = match inner.free.pop() {
            Some(slot) => {
                inner.nodes[slot] = node;
                slot
            }
            None => {
                inner.nodes.push(node);
                inner.nodes.len() - 1
            }
        };
        inner.map.insert(key, slot);
        inner.attach_tail(slot);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity (post-coercion).
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}
