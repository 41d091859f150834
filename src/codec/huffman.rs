//! Huffman codec
//!
//! Accumulates byte frequencies, derives a codebook from them, and
//! encodes/decodes fields against the current codebook.

use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::{KvError, Result};

use super::tree::assign_codes;
use super::Codebook;

/// Frequency counter plus the codebook of the last `build` or `load`
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    frequencies: [u64; 256],
    codebook: Codebook,
}

impl HuffmanCodec {
    pub fn new() -> Self {
        Self {
            frequencies: [0; 256],
            codebook: Codebook::default(),
        }
    }

    /// Count every byte of `bytes` toward the next `build`
    pub fn observe(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.frequencies[byte as usize] += 1;
        }
    }

    /// Total bytes counted since the last `build`
    pub fn observed(&self) -> u64 {
        self.frequencies.iter().sum()
    }

    /// Replace the codebook with one derived from the counted frequencies,
    /// then reset the counts.
    ///
    /// Succeeds without touching the codebook when nothing was counted.
    pub fn build(&mut self) -> Result<()> {
        let Some(assignment) = assign_codes(&self.frequencies)? else {
            return Ok(());
        };

        let codebook = Codebook::from_codes(assignment.codes)?;
        if codebook.padding() != Some(assignment.padding) {
            return Err(KvError::invalid(
                "padding leaf does not match the gap in the code trie",
            ));
        }

        debug!(
            symbols = codebook.len(),
            bytes = self.observed(),
            "built huffman codebook"
        );
        self.codebook = codebook;
        self.frequencies = [0; 256];
        Ok(())
    }

    /// Write the codebook sidecar
    pub fn save(&self, path: &Path) -> Result<()> {
        self.codebook.save(path)
    }

    /// Replace the codebook with one read from a sidecar
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.codebook = Codebook::load(path)?;
        debug!(symbols = self.codebook.len(), path = %path.display(), "loaded huffman codebook");
        Ok(())
    }

    /// Pack `plain` with the current codebook.
    ///
    /// Fails on a byte with no code or when the result exceeds the
    /// single-byte length prefix.
    pub fn encode(&self, plain: &[u8]) -> Result<Bytes> {
        self.codebook.encode(plain)
    }

    /// Unpack exactly `len` bytes from the front of `src`
    pub fn decode(&self, src: &[u8], len: usize) -> Result<Vec<u8>> {
        let encoded = src.get(..len).ok_or_else(|| {
            KvError::corruption(format!(
                "encoded field needs {} bytes, {} available",
                len,
                src.len()
            ))
        })?;
        self.codebook.decode(encoded)
    }

    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }
}

impl Default for HuffmanCodec {
    fn default() -> Self {
        Self::new()
    }
}
