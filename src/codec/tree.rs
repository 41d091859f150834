//! Huffman tree construction
//!
//! Builds the tree bottom-up from a min-heap of weighted leaves and walks it
//! to assign a code to every leaf.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{KvError, Result};

use super::Code;

/// What a leaf stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    Byte(u8),
    /// Reserved leaf whose path pads the last byte of a field
    Padding,
}

#[derive(Debug)]
enum TreeNode {
    Leaf(Symbol),
    Internal { left: usize, right: usize },
}

/// Codes derived from one tree
pub(super) struct Assignment {
    pub(super) codes: Vec<Option<Code>>,
    pub(super) padding: Code,
}

/// Build a Huffman code for every byte with a non-zero count.
///
/// Returns `None` when nothing was counted. Ties in weight are broken by
/// queue insertion order: the padding leaf, then leaves by byte value, then
/// internal nodes in the order they were created.
pub(super) fn assign_codes(frequencies: &[u64; 256]) -> Result<Option<Assignment>> {
    if frequencies.iter().all(|&f| f == 0) {
        return Ok(None);
    }

    let mut nodes: Vec<TreeNode> = Vec::with_capacity(2 * 257);
    // (weight, insertion order) with the smallest on top
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::new();

    nodes.push(TreeNode::Leaf(Symbol::Padding));
    heap.push(Reverse((0, 0)));
    for (byte, &weight) in frequencies.iter().enumerate() {
        if weight > 0 {
            heap.push(Reverse((weight, nodes.len())));
            nodes.push(TreeNode::Leaf(Symbol::Byte(byte as u8)));
        }
    }

    // At least two leaves (padding + one byte), so the root is internal
    while heap.len() > 1 {
        let (Some(Reverse((lw, left))), Some(Reverse((rw, right)))) = (heap.pop(), heap.pop())
        else {
            break;
        };
        heap.push(Reverse((lw + rw, nodes.len())));
        nodes.push(TreeNode::Internal { left, right });
    }
    let Some(Reverse((_, root))) = heap.pop() else {
        return Ok(None);
    };

    let mut codes = vec![None; 256];
    let mut padding = None;
    let mut stack = vec![(root, Code::EMPTY)];

    while let Some((id, code)) = stack.pop() {
        match nodes[id] {
            TreeNode::Leaf(Symbol::Byte(byte)) => codes[byte as usize] = Some(code),
            TreeNode::Leaf(Symbol::Padding) => padding = Some(code),
            TreeNode::Internal { left, right } => {
                let too_long = || {
                    KvError::invalid(format!(
                        "huffman code deeper than {} bits",
                        super::MAX_CODE_LEN
                    ))
                };
                stack.push((right, code.push(true).ok_or_else(too_long)?));
                stack.push((left, code.push(false).ok_or_else(too_long)?));
            }
        }
    }

    match padding {
        Some(padding) => Ok(Some(Assignment { codes, padding })),
        None => Err(KvError::invalid("huffman tree lost its padding leaf")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(u8, u64)]) -> [u64; 256] {
        let mut f = [0u64; 256];
        for &(b, w) in pairs {
            f[b as usize] = w;
        }
        f
    }

    #[test]
    fn test_nothing_counted() {
        assert!(assign_codes(&[0u64; 256]).unwrap().is_none());
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let a = assign_codes(&freqs(&[(b'x', 10)])).unwrap().unwrap();
        assert_eq!(a.codes[b'x' as usize].unwrap().len(), 1);
        assert_eq!(a.padding.len(), 1);
    }

    #[test]
    fn test_frequent_symbols_get_shorter_codes() {
        let a = assign_codes(&freqs(&[(b'a', 100), (b'b', 10), (b'c', 1)]))
            .unwrap()
            .unwrap();
        let len = |b: u8| a.codes[b as usize].unwrap().len();
        assert!(len(b'a') <= len(b'b'));
        assert!(len(b'b') <= len(b'c'));
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let mut f = [0u64; 256];
        for (i, w) in f.iter_mut().enumerate() {
            *w = (i as u64 % 17) + 1;
        }
        let a = assign_codes(&f).unwrap().unwrap();
        let mut all: Vec<Code> = a.codes.iter().flatten().copied().collect();
        all.push(a.padding);

        for (i, x) in all.iter().enumerate() {
            for (j, y) in all.iter().enumerate() {
                if i != j {
                    assert!(x != y && !x.is_proper_prefix_of(*y));
                }
            }
        }
    }
}
