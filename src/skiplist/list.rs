//! SkipList implementation
//!
//! Arena-backed skip list with an RwLock for concurrency.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{BytewiseComparator, Comparator};

use super::cursor::Cursor;
use super::{NodeId, HEAD, MAX_LEVEL};

/// A single node: owned key/value bytes plus its tower of forward links
pub(super) struct Node {
    pub(super) key: Box<[u8]>,
    pub(super) value: Box<[u8]>,
    /// `next[i]` is the successor at level `i`; `next.len()` is the node's level
    pub(super) next: Vec<Option<NodeId>>,
}

impl Node {
    fn new(key: &[u8], value: &[u8], level: usize) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            next: vec![None; level],
        }
    }
}

/// Node storage. Freed slots are emptied and recycled through `free`.
pub(super) struct Arena {
    pub(super) nodes: Vec<Node>,
    free: Vec<NodeId>,
    rng: StdRng,
    len: usize,
    bytes: usize,
}

impl Arena {
    fn new(rng: StdRng) -> Self {
        Self {
            nodes: vec![Node::new(&[], &[], MAX_LEVEL)],
            free: Vec::new(),
            rng,
            len: 0,
            bytes: 0,
        }
    }

    /// Flip a fair coin until tails or `MAX_LEVEL`
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.random_bool(0.5) {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, key: &[u8], value: &[u8], level: usize) -> NodeId {
        self.len += 1;
        self.bytes += key.len() + value.len();

        let node = Node::new(key, value, level);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Destroy a node that is no longer linked at any level
    fn release(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        self.len -= 1;
        self.bytes -= node.key.len() + node.value.len();

        node.key = Box::default();
        node.value = Box::default();
        node.next = Vec::new();
        self.free.push(id);
    }
}

/// Ordered map from byte keys to byte values
///
/// ## Concurrency
/// - Mutations (insert/update/erase) hold the write lock for the
///   predecessor search and the splice
/// - Lookups and cursors hold the read lock, so readers never block each
///   other
/// - A live `Cursor` blocks writers; drop it before mutating from the same
///   thread
pub struct SkipList {
    comparator: Arc<dyn Comparator>,
    inner: RwLock<Arena>,
}

impl SkipList {
    /// Create an empty list with byte-wise ordering and an OS-seeded level
    /// generator
    pub fn new() -> Self {
        Self::with_comparator(Arc::new(BytewiseComparator))
    }

    /// Create an empty list with a custom ordering and an OS-seeded level
    /// generator
    pub fn with_comparator(comparator: Arc<dyn Comparator>) -> Self {
        Self::with_rng(comparator, StdRng::from_os_rng())
    }

    /// Create an empty list with a fixed level seed (deterministic shape)
    pub fn with_seed(comparator: Arc<dyn Comparator>, seed: u64) -> Self {
        Self::with_rng(comparator, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(comparator: Arc<dyn Comparator>, rng: StdRng) -> Self {
        Self {
            comparator,
            inner: RwLock::new(Arena::new(rng)),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Insert a new key.
    ///
    /// Returns a cursor at the new node, or `None` if the key already
    /// exists (use `update` to change its value).
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Option<Cursor<'_>> {
        let mut arena = self.inner.write();
        let prev = self.find_predecessors(&arena, key);
        if self.successor_if_equal(&arena, prev[0], key).is_some() {
            return None;
        }

        let level = arena.random_level();
        let id = arena.alloc(key, value, level);
        for (i, &p) in prev.iter().enumerate().take(level) {
            arena.nodes[id].next[i] = arena.nodes[p].next[i];
            arena.nodes[p].next[i] = Some(id);
        }

        Some(Cursor::new(RwLockWriteGuard::downgrade(arena), Some(id)))
    }

    /// Replace the value of an existing key.
    ///
    /// The old node is swapped for a fresh one of the same level. Returns
    /// `None` if the key is absent or the value is unchanged.
    pub fn update(&self, key: &[u8], new_value: &[u8]) -> Option<Cursor<'_>> {
        let mut arena = self.inner.write();
        let prev = self.find_predecessors(&arena, key);
        let old = self.successor_if_equal(&arena, prev[0], key)?;
        if *arena.nodes[old].value == *new_value {
            return None;
        }

        let level = arena.nodes[old].next.len();
        let id = arena.alloc(key, new_value, level);
        for (i, &p) in prev.iter().enumerate().take(level) {
            debug_assert_eq!(arena.nodes[p].next[i], Some(old));
            arena.nodes[id].next[i] = arena.nodes[old].next[i];
            arena.nodes[p].next[i] = Some(id);
        }
        arena.release(old);

        Some(Cursor::new(RwLockWriteGuard::downgrade(arena), Some(id)))
    }

    /// Remove a key. Returns whether a node was removed.
    pub fn erase(&self, key: &[u8]) -> bool {
        let mut arena = self.inner.write();
        let prev = self.find_predecessors(&arena, key);
        let Some(target) = self.successor_if_equal(&arena, prev[0], key) else {
            return false;
        };

        for (i, &p) in prev.iter().enumerate() {
            // Above the node's own level the predecessor no longer points at it
            if arena.nodes[p].next[i] != Some(target) {
                break;
            }
            arena.nodes[p].next[i] = arena.nodes[target].next[i];
        }
        arena.release(target);
        true
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Find a key. Returns a cursor positioned at it.
    pub fn lookup(&self, key: &[u8]) -> Option<Cursor<'_>> {
        let arena = self.inner.read();
        let prev = self.find_predecessors(&arena, key);
        let id = self.successor_if_equal(&arena, prev[0], key)?;
        Some(Cursor::new(arena, Some(id)))
    }

    /// Copy out the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.lookup(key).map(|cursor| cursor.value().to_vec())
    }

    /// Cursor at the smallest key (past-the-end when empty)
    pub fn begin(&self) -> Cursor<'_> {
        let arena = self.inner.read();
        let first = arena.nodes[HEAD].next[0];
        Cursor::new(arena, first)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate bytes owned by stored keys and values
    pub fn size(&self) -> usize {
        self.inner.read().bytes
    }

    /// Render every non-empty level, highest first, for debugging
    pub fn render_levels(&self) -> String {
        let arena = self.inner.read();
        let mut out = String::new();

        for level in (0..MAX_LEVEL).rev() {
            let mut cur = arena.nodes[HEAD].next[level];
            if cur.is_none() {
                continue;
            }
            let _ = write!(out, "level {}:", level);
            while let Some(id) = cur {
                let node = &arena.nodes[id];
                let _ = write!(out, " {}", String::from_utf8_lossy(&node.key));
                cur = node.next[level];
            }
            out.push('\n');
        }
        out
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// One top-down sweep recording, per level, the last node whose key is
    /// strictly less than `key`
    fn find_predecessors(&self, arena: &Arena, key: &[u8]) -> [NodeId; MAX_LEVEL] {
        let mut prev = [HEAD; MAX_LEVEL];
        let mut cur = HEAD;

        for level in (0..MAX_LEVEL).rev() {
            while let Some(next) = arena.nodes[cur].next[level] {
                if self.comparator.compare(&arena.nodes[next].key, key) != Ordering::Less {
                    break;
                }
                cur = next;
            }
            prev[level] = cur;
        }
        prev
    }

    /// Level-0 successor of `prev`, if its key equals `key`
    fn successor_if_equal(&self, arena: &Arena, prev: NodeId, key: &[u8]) -> Option<NodeId> {
        let next = arena.nodes[prev].next[0]?;
        match self.comparator.compare(&arena.nodes[next].key, key) {
            Ordering::Equal => Some(next),
            _ => None,
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every level sorted, and level membership implies membership below
    fn assert_towers(list: &SkipList) {
        let arena = list.inner.read();
        let cmp = &list.comparator;

        for level in 0..MAX_LEVEL {
            let mut prev: Option<NodeId> = None;
            let mut cur = arena.nodes[HEAD].next[level];
            while let Some(id) = cur {
                let node = &arena.nodes[id];
                assert!(node.next.len() > level, "node linked above its level");
                if let Some(p) = prev {
                    assert_eq!(
                        cmp.compare(&arena.nodes[p].key, &node.key),
                        Ordering::Less
                    );
                }
                if level > 0 {
                    // Must also be reachable on the level below
                    let mut below = arena.nodes[HEAD].next[level - 1];
                    while below != Some(id) {
                        below = arena.nodes[below.expect("tower broken")].next[level - 1];
                    }
                }
                prev = cur;
                cur = node.next[level];
            }
        }
    }

    #[test]
    fn test_towers_hold_across_mutations() {
        let list = SkipList::with_seed(Arc::new(BytewiseComparator), 7);
        for i in 0..200u32 {
            let key = format!("k{:03}", (i * 37) % 200);
            assert!(list.insert(key.as_bytes(), b"v").is_some());
        }
        assert_towers(&list);

        for i in (0..200u32).step_by(3) {
            let key = format!("k{:03}", i);
            assert!(list.erase(key.as_bytes()));
        }
        assert_towers(&list);

        for i in (1..200u32).step_by(3) {
            let key = format!("k{:03}", i);
            assert!(list.update(key.as_bytes(), b"changed").is_some());
        }
        assert_towers(&list);
    }

    #[test]
    fn test_update_keeps_level() {
        let list = SkipList::with_seed(Arc::new(BytewiseComparator), 11);
        for i in 0..64u32 {
            list.insert(format!("{:02}", i).as_bytes(), b"a");
        }
        let levels_before: Vec<usize> = {
            let arena = list.inner.read();
            let mut out = Vec::new();
            let mut cur = arena.nodes[HEAD].next[0];
            while let Some(id) = cur {
                out.push(arena.nodes[id].next.len());
                cur = arena.nodes[id].next[0];
            }
            out
        };

        for i in 0..64u32 {
            list.update(format!("{:02}", i).as_bytes(), b"b");
        }

        let arena = list.inner.read();
        let mut cur = arena.nodes[HEAD].next[0];
        for expected in levels_before {
            let id = cur.expect("same number of nodes");
            assert_eq!(arena.nodes[id].next.len(), expected);
            cur = arena.nodes[id].next[0];
        }
    }

    #[test]
    fn test_released_slots_are_reused() {
        let list = SkipList::with_seed(Arc::new(BytewiseComparator), 3);
        list.insert(b"a", b"1");
        list.insert(b"b", b"2");
        assert!(list.erase(b"a"));
        list.insert(b"c", b"3");

        let arena = list.inner.read();
        assert_eq!(arena.nodes.len(), 3); // head + two live slots
        assert_eq!(arena.len, 2);
    }

    #[test]
    fn test_random_level_bounds() {
        let mut arena = Arena::new(StdRng::seed_from_u64(42));
        let mut ones = 0;
        for _ in 0..10_000 {
            let level = arena.random_level();
            assert!((1..=MAX_LEVEL).contains(&level));
            if level == 1 {
                ones += 1;
            }
        }
        // Geometric with p = 1/2: about half stay at level 1
        assert!((4_000..6_000).contains(&ones));
    }
}
