//! Configuration for HuffKV
//!
//! Centralized table options with sensible defaults, plus the key ordering
//! used by the in-memory index.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Defines the order of keys in a table.
///
/// Implementations must be a total order; the index relies on it to keep
/// every level sorted.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Name shown in debug output
    fn name(&self) -> &str;
}

/// Byte-wise lexicographic order over the shared prefix; on a tie the
/// shorter key sorts first.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let n = a.len().min(b.len());
        match a[..n].cmp(&b[..n]) {
            Ordering::Equal => a.len().cmp(&b.len()),
            other => other,
        }
    }

    fn name(&self) -> &str {
        "huffkv.BytewiseComparator"
    }
}

/// Options for a single table file
#[derive(Clone)]
pub struct Options {
    // -------------------------------------------------------------------------
    // Open Behaviour
    // -------------------------------------------------------------------------
    /// Create the data file on open if it does not exist
    pub create_if_missing: bool,

    /// Fail open if the data file already exists
    pub error_if_exists: bool,

    /// Dump every entry to disk when the table is closed
    pub dump_when_close: bool,

    // -------------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------------
    /// Maximum size of a single *entry*, not of the file.
    ///
    /// `put` rejects a pair when `1 + key.len() + 1 + value.len()` exceeds
    /// this value. The name is kept for compatibility with existing callers.
    pub max_file_size: usize,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Key ordering for the in-memory index
    pub comparator: Arc<dyn Comparator>,

    /// Seed for the index's level generator (`None` seeds from the OS)
    pub level_seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            error_if_exists: false,
            dump_when_close: true,
            max_file_size: 512 * 1024 * 1024, // 512 MB
            comparator: Arc::new(BytewiseComparator),
            level_seed: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("create_if_missing", &self.create_if_missing)
            .field("error_if_exists", &self.error_if_exists)
            .field("dump_when_close", &self.dump_when_close)
            .field("max_file_size", &self.max_file_size)
            .field("comparator", &self.comparator.name())
            .field("level_seed", &self.level_seed)
            .finish()
    }
}

impl Options {
    /// Create a new options builder
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }
}

/// Builder for Options
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn create_if_missing(mut self, yes: bool) -> Self {
        self.options.create_if_missing = yes;
        self
    }

    pub fn error_if_exists(mut self, yes: bool) -> Self {
        self.options.error_if_exists = yes;
        self
    }

    pub fn dump_when_close(mut self, yes: bool) -> Self {
        self.options.dump_when_close = yes;
        self
    }

    /// Set the per-entry size cap (in bytes)
    pub fn max_file_size(mut self, size: usize) -> Self {
        self.options.max_file_size = size;
        self
    }

    /// Set the key ordering
    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.options.comparator = comparator;
        self
    }

    /// Fix the level generator seed (deterministic index shape)
    pub fn level_seed(mut self, seed: u64) -> Self {
        self.options.level_seed = Some(seed);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}
