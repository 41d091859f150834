//! SkipList Cursor
//!
//! Forward-only walk over level 0 of a skip list.

use parking_lot::RwLockReadGuard;

use super::list::Arena;
use super::{NodeId, HEAD};

/// Position in a `SkipList`, in ascending key order.
///
/// Holds the list's read lock for as long as it lives. Restart a walk with
/// `SkipList::begin()`.
pub struct Cursor<'a> {
    arena: RwLockReadGuard<'a, Arena>,
    node: Option<NodeId>,
}

impl<'a> Cursor<'a> {
    pub(super) fn new(arena: RwLockReadGuard<'a, Arena>, node: Option<NodeId>) -> Self {
        Self { arena, node }
    }

    /// Not past the end
    pub fn good(&self) -> bool {
        self.node.is_some()
    }

    /// Move to the next key. No-op once past the end.
    pub fn advance(&mut self) {
        if let Some(id) = self.node {
            self.node = self.arena.nodes[id].next[0];
        }
    }

    /// Current key (empty once past the end)
    pub fn key(&self) -> &[u8] {
        &self.arena.nodes[self.node.unwrap_or(HEAD)].key
    }

    /// Current value (empty once past the end)
    pub fn value(&self) -> &[u8] {
        &self.arena.nodes[self.node.unwrap_or(HEAD)].value
    }

    /// Current entry, or `None` once past the end
    pub fn entry(&self) -> Option<(&[u8], &[u8])> {
        self.node.map(|id| {
            let node = &self.arena.nodes[id];
            (&*node.key, &*node.value)
        })
    }
}
