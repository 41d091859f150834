//! # HuffKV
//!
//! An embedded, single-file key-value store with:
//! - An ordered in-memory skip list index
//! - Huffman-compressed snapshots of every key and value
//! - A text codebook sidecar rebuilt on every dump
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Table                                │
//! │          open / close / dump / get / put / del               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  SkipList   │          │    Codec    │
//!   │  (RwLock)   │          │  (Huffman)  │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                      ┌────────────┴────────────┐
//!                      ▼                         ▼
//!               ┌─────────────┐          ┌───────────────┐
//!               │  Data file  │          │   Codebook    │
//!               │  (packed)   │          │ .huffman_code │
//!               └─────────────┘          └───────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use huffkv::{Options, Table};
//!
//! let options = Options::builder().create_if_missing(true).build();
//! let table = Table::new(options, "data.tbl");
//! table.open()?;
//! table.put(b"key", b"value")?;
//! assert_eq!(table.get(b"key")?, b"value");
//! table.close()?;
//! # Ok::<(), huffkv::KvError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod skiplist;
pub mod codec;
pub mod table;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{BytewiseComparator, Comparator, Options};
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of HuffKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
