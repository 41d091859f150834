//! Table Module
//!
//! A single-file key-value table that coordinates the index, the codec and
//! the two files on disk.
//!
//! ## Responsibilities
//! - Load the codebook and every entry into the index on open
//! - Serve get/put/del purely from memory
//! - Rebuild the codebook and rewrite the data file on dump/close
//!
//! ## Data File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Entry 1                                                      │
//! │ ┌────────────┬───────────┬────────────┬───────────────────┐  │
//! │ │ KeyLen (1) │ Key bits  │ ValLen (1) │ Value bits        │  │
//! │ └────────────┴───────────┴────────────┴───────────────────┘  │
//! │ ... repeated until EOF, no header ...                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! Lengths count *encoded* bytes. Each field is Huffman-packed MSB-first and
//! padded to a byte boundary.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use memmap2::Mmap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::codec::{Codebook, HuffmanCodec, CODEBOOK_SUFFIX, MAX_FIELD_LEN};
use crate::config::Options;
use crate::error::{KvError, Result};
use crate::skiplist::SkipList;

/// In-memory state that only exists while the table is open
struct OpenTable {
    index: SkipList,
    /// Codebook of the last load or dump
    codec: Mutex<HuffmanCodec>,
}

/// An embedded table backed by one data file and one codebook sidecar
///
/// ## Concurrency Model
///
/// - **get/put/del**: take the state read lock; the index serializes its own
///   mutations, so these may be called from many threads at once
/// - **open/close**: take the state write lock
/// - **dump**: takes the state read lock and walks the index twice. A
///   put/del that lands between the two walks may be missed, or may fail
///   the dump with an unknown symbol. File writes happen after both walks,
///   with the index unlocked, so get/put/del never wait on disk I/O.
pub struct Table {
    options: Options,
    path: PathBuf,
    codebook_path: PathBuf,
    state: RwLock<Option<OpenTable>>,
}

impl Table {
    /// Create a closed table for `path`. Call `open()` before use.
    pub fn new(options: Options, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let codebook_path = Self::codebook_path_for(&path);
        Self {
            options,
            path,
            codebook_path,
            state: RwLock::new(None),
        }
    }

    /// Open the table, loading any persisted entries into memory
    ///
    /// Steps:
    /// 1. Check existence against `create_if_missing` / `error_if_exists`
    /// 2. Create a fresh index and codec
    /// 3. If the data file is non-empty, load the codebook sidecar
    /// 4. Map the data file and insert every decoded entry
    pub fn open(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.is_some() {
            return Err(KvError::invalid("table is already open"));
        }

        // Step 1: Existence checks
        let exists = match fs::metadata(&self.path) {
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if exists && self.options.error_if_exists {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and error_if_exists is true", self.path.display()),
            )
            .into());
        }
        if !exists {
            if !self.options.create_if_missing {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", self.path.display()),
                )
                .into());
            }
            File::create(&self.path)?;
        }

        // Step 2: Fresh in-memory state
        let index = self.new_index();
        let mut codec = HuffmanCodec::new();

        // Step 3 & 4: Load persisted entries
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        if file_len > 0 {
            codec.load(&self.codebook_path)?;

            // SAFETY: the map is read-only and dropped before this call
            // returns; the table is the only writer of its data file.
            let mmap = unsafe { Mmap::map(&file)? };
            Self::load_entries(&mmap, &codec, &index)?;
        }

        info!(
            path = %self.path.display(),
            entries = index.len(),
            bytes = file_len,
            "opened table"
        );

        *state = Some(OpenTable {
            index,
            codec: Mutex::new(codec),
        });
        Ok(())
    }

    /// Close the table, dumping first when `dump_when_close` is set
    ///
    /// A failed dump leaves the table open.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        let open = state.as_ref().ok_or_else(Self::closed)?;

        if self.options.dump_when_close {
            self.dump_open(open)?;
        }

        *state = None;
        info!(path = %self.path.display(), "closed table");
        Ok(())
    }

    /// Persist every entry to disk
    ///
    /// Walks the index once to count byte frequencies and build a fresh
    /// codebook, then walks it again to encode every entry in memory. Only
    /// then are the codebook sidecar and the data file rewritten, so an
    /// encode failure leaves both files untouched. An I/O failure may leave
    /// them partially written.
    pub fn dump(&self) -> Result<()> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;
        self.dump_open(open)
    }

    /// Get the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;
        open.index.get(key).ok_or(KvError::NotFound)
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;
        let found = open.index.lookup(key).is_some();
        Ok(found)
    }

    /// Insert or overwrite `key`
    ///
    /// Rejects the pair when its plaintext entry (two length bytes plus key
    /// and value) exceeds `max_file_size`, or when either field is longer
    /// than the length prefix can describe. Nothing touches disk until the
    /// next dump.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;

        let entry_size = 2 + key.len() + value.len();
        if entry_size > self.options.max_file_size {
            return Err(KvError::invalid(format!(
                "size of entry is too large: {} > {}",
                entry_size, self.options.max_file_size
            )));
        }
        if key.len() > MAX_FIELD_LEN || value.len() > MAX_FIELD_LEN {
            return Err(KvError::invalid(format!(
                "key and value are limited to {} bytes",
                MAX_FIELD_LEN
            )));
        }

        loop {
            if open.index.insert(key, value).is_some() {
                break;
            }
            if open.index.update(key, value).is_some() {
                break;
            }
            // Unchanged value, or the key was erased between the two calls
            if open.index.lookup(key).is_some() {
                break;
            }
        }
        debug!(key_len = key.len(), value_len = value.len(), "put");
        Ok(())
    }

    /// Remove `key`
    pub fn del(&self, key: &[u8]) -> Result<()> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;

        if open.index.erase(key) {
            debug!(key_len = key.len(), "del");
            Ok(())
        } else {
            Err(KvError::NotFound)
        }
    }

    /// Copy out every entry in key order
    pub fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;

        let mut out = Vec::with_capacity(open.index.len());
        let mut cursor = open.index.begin();
        while let Some((key, value)) = cursor.entry() {
            out.push((key.to_vec(), value.to_vec()));
            cursor.advance();
        }
        Ok(out)
    }

    /// Number of entries in memory
    pub fn len(&self) -> Result<usize> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;
        Ok(open.index.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of the codebook from the last load or dump
    pub fn codebook(&self) -> Result<Codebook> {
        let state = self.state.read();
        let open = state.as_ref().ok_or_else(Self::closed)?;
        let codebook = open.codec.lock().codebook().clone();
        Ok(codebook)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the codebook sidecar
    pub fn codebook_path(&self) -> &Path {
        &self.codebook_path
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Sidecar path: the data file path plus `CODEBOOK_SUFFIX`
    pub fn codebook_path_for(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(CODEBOOK_SUFFIX);
        PathBuf::from(name)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn closed() -> KvError {
        KvError::invalid("table is closed")
    }

    fn new_index(&self) -> SkipList {
        let comparator = self.options.comparator.clone();
        match self.options.level_seed {
            Some(seed) => SkipList::with_seed(comparator, seed),
            None => SkipList::with_comparator(comparator),
        }
    }

    /// Decode `[len][key bits][len][value bits]` entries until EOF
    fn load_entries(data: &[u8], codec: &HuffmanCodec, index: &SkipList) -> Result<()> {
        let mut buf = data;
        while buf.has_remaining() {
            let key = Self::read_field(&mut buf, codec)?;
            let value = Self::read_field(&mut buf, codec)?;

            let inserted = index.insert(&key, &value).is_some();
            if !inserted {
                return Err(KvError::invalid(format!(
                    "insert fail, duplicate key {}",
                    String::from_utf8_lossy(&key)
                )));
            }
        }
        Ok(())
    }

    fn read_field(buf: &mut &[u8], codec: &HuffmanCodec) -> Result<Vec<u8>> {
        if !buf.has_remaining() {
            return Err(KvError::corruption("data file ends inside an entry"));
        }
        let len = buf.get_u8() as usize;
        let field = codec.decode(buf.chunk(), len)?;
        buf.advance(len);
        Ok(field)
    }

    fn dump_open(&self, open: &OpenTable) -> Result<()> {
        // Pass 1: learn byte frequencies
        let mut codec = HuffmanCodec::new();
        let mut cursor = open.index.begin();
        while let Some((key, value)) = cursor.entry() {
            codec.observe(key);
            codec.observe(value);
            cursor.advance();
        }
        drop(cursor);
        codec.build()?;

        // Pass 2: pack every entry in memory with the new codebook
        let (data, entries) = Self::encode_entries(&open.index, &codec)?;

        // The index lock is released before any file is touched
        codec.save(&self.codebook_path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        *open.codec.lock() = codec;

        info!(
            path = %self.path.display(),
            entries,
            bytes = data.len(),
            "dumped table"
        );
        Ok(())
    }

    /// Encode every entry as `[len][key bits][len][value bits]`
    ///
    /// Holds the index read lock only while walking it.
    fn encode_entries(index: &SkipList, codec: &HuffmanCodec) -> Result<(Bytes, usize)> {
        let mut buf = BytesMut::with_capacity(index.size() + 2 * index.len());
        let mut entries = 0usize;

        let mut cursor = index.begin();
        while let Some((key, value)) = cursor.entry() {
            for field in [key, value] {
                let encoded = codec.encode(field)?;
                buf.put_u8(encoded.len() as u8);
                buf.put_slice(&encoded);
            }
            entries += 1;
            cursor.advance();
        }
        Ok((buf.freeze(), entries))
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        if !self.is_open() {
            return;
        }
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to close table on drop");
        }
    }
}
