//! Fixed-size values of the etschash data model.
//!
//! Everything the algorithm touches is either a 256-bit digest or a 512-bit
//! node. Node words are stored little-endian in memory; all word-level
//! arithmetic goes through the accessors below, so big-endian hosts read and
//! write the same bytes as little-endian ones.

use bytemuck::{Pod, Zeroable};
use byteorder::{ByteOrder, LittleEndian};

/// Size of a cache/dataset node in bytes.
pub const NODE_BYTES: usize = 64;

/// 32-bit words per node.
pub const NODE_WORDS: usize = NODE_BYTES / 4;

/// A 256-bit digest: header hashes, seed hashes, mix hashes, results and
/// difficulty boundaries.
pub type H256 = [u8; 32];

/// A 512-bit node, the unit of cache and dataset storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Node {
    pub bytes: [u8; NODE_BYTES],
}

// Plain bytes; lets a mapped DAG body be viewed as `&[Node]` without copies.
unsafe impl Zeroable for Node {}
unsafe impl Pod for Node {}

impl Default for Node {
    fn default() -> Self {
        Node {
            bytes: [0u8; NODE_BYTES],
        }
    }
}

impl Node {
    /// Read word `i` as a little-endian 32-bit integer.
    #[inline]
    pub fn word(&self, i: usize) -> u32 {
        LittleEndian::read_u32(&self.bytes[i * 4..i * 4 + 4])
    }

    /// Write word `i` as a little-endian 32-bit integer.
    #[inline]
    pub fn set_word(&mut self, i: usize, v: u32) {
        LittleEndian::write_u32(&mut self.bytes[i * 4..i * 4 + 4], v);
    }

    /// Unpack all 16 words.
    #[inline]
    pub fn words(&self) -> [u32; NODE_WORDS] {
        let mut out = [0u32; NODE_WORDS];
        LittleEndian::read_u32_into(&self.bytes, &mut out);
        out
    }

    /// Repack all 16 words.
    #[inline]
    pub fn set_words(&mut self, words: &[u32; NODE_WORDS]) {
        LittleEndian::write_u32_into(words, &mut self.bytes);
    }
}

/// Big-endian numeric comparison `hash <= boundary`.
///
/// The boundary encodes the difficulty target; a nonce is acceptable when
/// its result digest does not exceed it.
pub fn check_difficulty(hash: &H256, boundary: &H256) -> bool {
    for i in 0..32 {
        if hash[i] != boundary[i] {
            return hash[i] < boundary[i];
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_access_is_little_endian() {
        let mut node = Node::default();
        node.set_word(0, 0x0403_0201);
        assert_eq!(&node.bytes[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(node.word(0), 0x0403_0201);

        node.set_word(15, 0xdead_beef);
        assert_eq!(node.words()[15], 0xdead_beef);
    }

    #[test]
    fn words_roundtrip() {
        let mut node = Node::default();
        let mut words = [0u32; NODE_WORDS];
        for (i, w) in words.iter_mut().enumerate() {
            *w = (i as u32).wrapping_mul(0x9e37_79b9);
        }
        node.set_words(&words);
        assert_eq!(node.words(), words);
    }

    #[test]
    fn difficulty_comparison_is_big_endian() {
        let mut hash = [0u8; 32];
        let mut boundary = [0u8; 32];
        boundary[0] = 0x10;

        hash[0] = 0x0f;
        hash[31] = 0xff; // low-order bytes must not override the leading byte
        assert!(check_difficulty(&hash, &boundary));

        hash[0] = 0x10;
        hash[31] = 0x00;
        boundary[31] = 0x01;
        assert!(check_difficulty(&hash, &boundary));

        hash[31] = 0x02;
        assert!(!check_difficulty(&hash, &boundary));
    }

    #[test]
    fn equal_hash_meets_boundary() {
        let boundary = [0xab_u8; 32];
        let hash = boundary;
        assert!(check_difficulty(&hash, &boundary));
    }
}
