//! Codebook
//!
//! Forward (byte → code) and inverse (bits → byte) tables for one dump
//! cycle, plus the sidecar text format.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::Bytes;

use crate::error::{KvError, Result};

use super::bits::{bits, BitWriter};
use super::{Code, MAX_FIELD_LEN};

/// Outgoing edge of a trie node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Absent,
    Node(usize),
    Leaf(u8),
}

/// Inverse table: a binary trie over the literal code bits, so each leaf is
/// identified by its position, not by a numeric value
#[derive(Debug, Clone)]
struct DecodeTrie {
    nodes: Vec<[Link; 2]>,
}

impl DecodeTrie {
    const ROOT: usize = 0;

    fn new() -> Self {
        Self {
            nodes: vec![[Link::Absent; 2]],
        }
    }

    fn insert(&mut self, code: Code, byte: u8) -> Result<()> {
        let mut node = Self::ROOT;
        for i in 0..code.len() {
            let bit = code.bit(i) as usize;
            let last = i + 1 == code.len();
            match (self.nodes[node][bit], last) {
                (Link::Absent, true) => self.nodes[node][bit] = Link::Leaf(byte),
                (Link::Absent, false) => {
                    self.nodes.push([Link::Absent; 2]);
                    let next = self.nodes.len() - 1;
                    self.nodes[node][bit] = Link::Node(next);
                    node = next;
                }
                (Link::Node(next), false) => node = next,
                _ => {
                    return Err(KvError::corruption(format!(
                        "code {:#b} for byte 0x{:02x} is not prefix-free",
                        code.to_sentinel(),
                        byte
                    )))
                }
            }
        }
        Ok(())
    }

    /// Path to the first absent branch, depth-first with 0 before 1
    fn first_gap(&self) -> Option<Code> {
        let mut edges = vec![(Self::ROOT, Code::EMPTY, true), (Self::ROOT, Code::EMPTY, false)];
        while let Some((node, path, bit)) = edges.pop() {
            let child = path.push(bit)?;
            match self.nodes[node][bit as usize] {
                Link::Absent => return Some(child),
                Link::Node(next) => {
                    edges.push((next, child, true));
                    edges.push((next, child, false));
                }
                Link::Leaf(_) => {}
            }
        }
        None
    }
}

/// Per-byte code table and its inverse
#[derive(Debug, Clone)]
pub struct Codebook {
    codes: Vec<Option<Code>>,
    padding: Option<Code>,
    trie: DecodeTrie,
}

impl Default for Codebook {
    fn default() -> Self {
        Self {
            codes: vec![None; 256],
            padding: None,
            trie: DecodeTrie::new(),
        }
    }
}

impl Codebook {
    /// Build from a byte → code table.
    ///
    /// Fails if the codes are not prefix-free, or if they cover every branch
    /// of the trie and leave no path for padding. The padding path is the
    /// first branch the byte codes leave uncovered.
    pub fn from_codes(codes: Vec<Option<Code>>) -> Result<Self> {
        if codes.len() != 256 {
            return Err(KvError::invalid("code table must cover 256 byte values"));
        }

        let mut trie = DecodeTrie::new();
        for (byte, code) in codes.iter().enumerate() {
            if let Some(code) = code {
                if code.is_empty() {
                    return Err(KvError::corruption(format!(
                        "empty code for byte 0x{:02x}",
                        byte
                    )));
                }
                trie.insert(*code, byte as u8)?;
            }
        }

        let padding = if codes.iter().any(Option::is_some) {
            let gap = trie.first_gap().ok_or_else(|| {
                KvError::corruption("code set is complete and leaves no padding path")
            })?;
            Some(gap)
        } else {
            None
        };

        Ok(Self {
            codes,
            padding,
            trie,
        })
    }

    /// Code assigned to `byte`
    pub fn code(&self, byte: u8) -> Option<Code> {
        self.codes[byte as usize]
    }

    /// Path reserved for padding; `None` only for an empty codebook
    pub fn padding(&self) -> Option<Code> {
        self.padding
    }

    /// Number of coded bytes
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Encode / Decode
    // =========================================================================

    /// Pack `plain` into a byte-aligned bit string
    pub fn encode(&self, plain: &[u8]) -> Result<Bytes> {
        let mut writer = BitWriter::with_capacity(plain.len());
        for &byte in plain {
            let code = self.code(byte).ok_or_else(|| {
                KvError::invalid(format!("unknown symbol 0x{:02x}", byte))
            })?;
            writer.push_code(code);
        }

        let pad = writer.pad_bits();
        if let Some(padding) = self.padding {
            for i in 0..pad.min(padding.len()) {
                writer.push_bit(padding.bit(i));
            }
        }

        let encoded = writer.finish();
        if encoded.len() > MAX_FIELD_LEN {
            return Err(KvError::invalid(format!(
                "encoded field is {} bytes, limit is {}",
                encoded.len(),
                MAX_FIELD_LEN
            )));
        }
        Ok(encoded)
    }

    /// Unpack a whole encoded field
    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let total_bits = encoded.len() * 8;
        // Padding, when present, lives entirely in the final byte
        let padding_start = total_bits.saturating_sub(8);

        let mut out = Vec::with_capacity(encoded.len() * 2);
        let mut node = DecodeTrie::ROOT;
        let mut pending = Code::EMPTY;

        for (pos, bit) in bits(encoded).enumerate() {
            let symbol_start = pos - pending.len() as usize;
            match self.trie.nodes[node][bit as usize] {
                Link::Node(next) => {
                    node = next;
                    pending = pending.push(bit).ok_or_else(|| {
                        KvError::corruption("bit pattern longer than any code")
                    })?;
                }
                Link::Leaf(byte) => {
                    out.push(byte);
                    node = DecodeTrie::ROOT;
                    pending = Code::EMPTY;
                }
                Link::Absent if self.padding.is_some() && symbol_start >= padding_start => {
                    return Ok(out)
                }
                Link::Absent => {
                    return Err(KvError::corruption("bit pattern matches no code"));
                }
            }
        }

        if !pending.is_empty() {
            let within_last_byte = pending.len() < 8;
            let is_padding = self
                .padding
                .is_some_and(|padding| pending.is_proper_prefix_of(padding));
            if !(within_last_byte && is_padding) {
                return Err(KvError::corruption("field ends inside a code"));
            }
        }
        Ok(out)
    }

    // =========================================================================
    // Sidecar Persistence
    // =========================================================================

    /// Write one `<byte> <sentinel code>` line per coded byte, by byte value
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (byte, code) in self.codes.iter().enumerate() {
            if let Some(code) = code {
                writer.write_all(&[byte as u8, b' '])?;
                writeln!(writer, "{}", code.to_sentinel())?;
            }
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Read a sidecar written by `save`
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Parse sidecar text. The first byte of a line is the raw symbol, so it
    /// may itself be a space, digit or newline.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut codes = vec![None; 256];
        let mut pos = 0;

        while pos < data.len() {
            let byte = data[pos];
            if data.get(pos + 1) != Some(&b' ') {
                return Err(KvError::corruption(format!(
                    "codebook line at offset {} has no separator",
                    pos
                )));
            }

            let digits_start = pos + 2;
            let line_end = data[digits_start..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(data.len(), |n| digits_start + n);

            let code = std::str::from_utf8(&data[digits_start..line_end])
                .ok()
                .and_then(|s| s.trim_end_matches('\r').parse::<u64>().ok())
                .and_then(Code::from_sentinel)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    KvError::corruption(format!(
                        "bad code for byte 0x{:02x} at offset {}",
                        byte, pos
                    ))
                })?;

            if codes[byte as usize].replace(code).is_some() {
                return Err(KvError::corruption(format!(
                    "byte 0x{:02x} coded twice",
                    byte
                )));
            }
            pos = line_end + 1;
        }

        Self::from_codes(codes)
    }
}
