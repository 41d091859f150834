//! Codec Module
//!
//! Frequency-driven variable-length bit packing for stored keys and values.
//!
//! ## Responsibilities
//! - Count byte frequencies over every key and value being dumped
//! - Derive a prefix-free Huffman code per byte
//! - Persist and reload that codebook as a text sidecar
//! - Pack/unpack byte strings MSB-first against the codebook
//!
//! ## Codebook Sidecar (`<datafile>.huffman_code`)
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ <raw byte> ' ' <decimal code-with-sentinel> \n │
//! │ ... one line per coded byte, by byte value ... │
//! └───────────────────────────────────────────────┘
//! ```
//! A code's integer form carries a leading 1-bit so that leading zero bits
//! survive: code `011` is stored as `0b1011` = `11`.
//!
//! ## Padding
//! Every tree reserves one extra leaf that no byte maps to. A field's final
//! byte is padded with the start of that leaf's path, so trailing padding
//! can never decode as a real symbol. The sidecar does not list the leaf:
//! it is the single branch missing from the trie of byte codes. A sidecar
//! whose codes cover the whole trie is rejected on load.

mod bits;
mod code;
mod codebook;
mod huffman;
mod tree;

pub use code::Code;
pub use codebook::Codebook;
pub use huffman::HuffmanCodec;

/// Suffix appended to the data file path to name the codebook sidecar
pub const CODEBOOK_SUFFIX: &str = ".huffman_code";

/// Longest code the sentinel form can hold in a `u64`
pub const MAX_CODE_LEN: u8 = 63;

/// Largest encoded field, bounded by the single-byte length prefix
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;
