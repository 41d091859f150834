//! SkipList Module
//!
//! Ordered in-memory index for a table.
//!
//! ## Responsibilities
//! - Point lookup, insert, update and erase in expected O(log n)
//! - Ordered, forward-only iteration for dumps
//! - Own copies of every key and value it stores
//!
//! ## Data Structure Choice
//! A probabilistic skip list whose nodes live in an arena and link to each
//! other by slot index. Each node carries a tower of forward links, one per
//! level it participates in:
//!
//! ```text
//! level 3: HEAD ───────────────────────────► d ──────────► ∅
//! level 2: HEAD ─────────► b ──────────────► d ──────────► ∅
//! level 1: HEAD ─────────► b ─────► c ─────► d ──────────► ∅
//! level 0: HEAD ─► a ────► b ─────► c ─────► d ─► e ─────► ∅
//! ```
//!
//! Slot 0 holds the sentinel head, which participates in every level and
//! never holds a key.

mod cursor;
mod list;

pub use cursor::Cursor;
pub use list::SkipList;

/// Highest level a node can reach
pub const MAX_LEVEL: usize = 16;

/// Stable slot index of a node in the arena
pub(crate) type NodeId = usize;

/// Slot of the sentinel head
pub(crate) const HEAD: NodeId = 0;
