//! Variable-length code values

use super::MAX_CODE_LEN;

/// A bit string of up to `MAX_CODE_LEN` bits, most significant bit first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Code {
    bits: u64,
    len: u8,
}

impl Code {
    /// The empty bit string (the tree root's path)
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    /// Build from the low `len` bits of `bits`
    pub fn new(bits: u64, len: u8) -> Option<Self> {
        if len > MAX_CODE_LEN {
            return None;
        }
        let mask = (1u64 << len) - 1;
        Some(Self { bits: bits & mask, len })
    }

    /// Parse the sentinel form: the highest set bit marks the code length
    pub fn from_sentinel(value: u64) -> Option<Self> {
        if value == 0 {
            return None;
        }
        let len = (63 - value.leading_zeros()) as u8;
        Self::new(value, len)
    }

    /// Integer form with a leading 1-bit above the code
    pub fn to_sentinel(self) -> u64 {
        (1u64 << self.len) | self.bits
    }

    pub fn bits(self) -> u64 {
        self.bits
    }

    pub fn len(self) -> u8 {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Bit `i`, counting from the most significant end
    pub fn bit(self, i: u8) -> bool {
        debug_assert!(i < self.len);
        (self.bits >> (self.len - 1 - i)) & 1 == 1
    }

    /// Extend by one bit. `None` past `MAX_CODE_LEN`.
    pub fn push(self, bit: bool) -> Option<Self> {
        if self.len >= MAX_CODE_LEN {
            return None;
        }
        Some(Self {
            bits: (self.bits << 1) | bit as u64,
            len: self.len + 1,
        })
    }

    /// True when `self` is a strict prefix of `other`
    pub fn is_proper_prefix_of(self, other: Code) -> bool {
        self.len < other.len && other.bits >> (other.len - self.len) == self.bits
    }
}
