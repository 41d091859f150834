//! MSB-first bit packing

use bytes::{BufMut, Bytes, BytesMut};

use super::Code;

/// Packs bits into bytes, most significant bit first
pub(super) struct BitWriter {
    buf: BytesMut,
    current: u8,
    filled: u8,
}

impl BitWriter {
    pub(super) fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(bytes),
            current: 0,
            filled: 0,
        }
    }

    pub(super) fn push_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 0x80 >> self.filled;
        }
        self.filled += 1;
        if self.filled == 8 {
            self.buf.put_u8(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    pub(super) fn push_code(&mut self, code: Code) {
        for i in 0..code.len() {
            self.push_bit(code.bit(i));
        }
    }

    /// Bits left before the next byte boundary
    pub(super) fn pad_bits(&self) -> u8 {
        (8 - self.filled) % 8
    }

    /// Flush the partial byte (zero-filled) and return the packed bytes
    pub(super) fn finish(mut self) -> Bytes {
        if self.filled > 0 {
            self.buf.put_u8(self.current);
        }
        self.buf.freeze()
    }
}

/// Iterate the bits of `data`, most significant bit of each byte first
pub(super) fn bits(data: &[u8]) -> impl Iterator<Item = bool> + '_ {
    data.iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
}
