//! The hashimoto mix and its quick re-verification path.
//!
//! One evaluation seeds a 128-byte mix from the header hash and nonce,
//! folds in 64 pseudo-random dataset pages, compresses the mix 4-to-1 into
//! the 32-byte mix hash, and finalises with Keccak-256. The dataset pages
//! come either from a materialised dataset or from on-demand derivation;
//! both sources yield bit-identical output.

use byteorder::{ByteOrder, LittleEndian};

use etschash_crypto::{fnv, keccak256, keccak512};

use crate::cache::Cache;
use crate::dag::calc_dataset_item;
use crate::node::{check_difficulty, Node, H256, NODE_BYTES, NODE_WORDS};
use crate::EtschashError;

/// Dataset page reads per evaluation.
pub const ACCESSES: usize = 64;

/// Bytes per mix page: two adjacent dataset nodes.
pub const MIX_BYTES: usize = 128;

/// Nodes per mix page.
pub const MIX_NODES: usize = MIX_BYTES / NODE_BYTES;

/// 32-bit words in the mix state.
pub const MIX_WORDS: usize = MIX_BYTES / 4;

/// Output of one hashimoto evaluation: the boundary-checked result digest
/// and the mix commitment carried in block headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowOutput {
    pub result: H256,
    pub mix_hash: H256,
}

/// Where hashimoto reads dataset nodes from.
pub(crate) enum DagSource<'a> {
    /// Derive each touched node from the cache (light path).
    Light(&'a Cache),
    /// Read from a fully materialised dataset (full path).
    Full(&'a [Node]),
}

impl DagSource<'_> {
    #[inline]
    fn node(&self, index: u32) -> Node {
        match self {
            DagSource::Light(cache) => calc_dataset_item(cache, index),
            DagSource::Full(nodes) => nodes[index as usize],
        }
    }
}

pub(crate) fn hashimoto(
    header_hash: &H256,
    nonce: u64,
    full_size: u64,
    dag: &DagSource<'_>,
) -> Result<PowOutput, EtschashError> {
    if full_size % MIX_BYTES as u64 != 0 {
        return Err(EtschashError::HashPrecondition(full_size));
    }

    // pack header hash and nonce into the first 40 bytes of the seed node
    let mut buf = [0u8; NODE_BYTES];
    buf[..32].copy_from_slice(header_hash);
    LittleEndian::write_u64(&mut buf[32..40], nonce);
    let seed = keccak512(&buf[..40]);

    let mut seed_words = [0u32; NODE_WORDS];
    LittleEndian::read_u32_into(&seed, &mut seed_words);

    // replicate the seed words across the two-node mix
    let mut mix = [0u32; MIX_WORDS];
    for (w, m) in mix.iter_mut().enumerate() {
        *m = seed_words[w % NODE_WORDS];
    }

    let num_pages = (full_size / MIX_BYTES as u64) as u32;
    for i in 0..ACCESSES as u32 {
        let page = fnv(seed_words[0] ^ i, mix[i as usize % MIX_WORDS]) % num_pages;
        for n in 0..MIX_NODES {
            let dag_node = dag.node(page * MIX_NODES as u32 + n as u32);
            let words = dag_node.words();
            for w in 0..NODE_WORDS {
                mix[n * NODE_WORDS + w] = fnv(mix[n * NODE_WORDS + w], words[w]);
            }
        }
    }

    // compress 4-to-1; the first eight compressed words are the mix hash
    let mut mix_hash = [0u8; 32];
    for w in (0..MIX_WORDS).step_by(4) {
        let reduced = fnv(fnv(fnv(mix[w], mix[w + 1]), mix[w + 2]), mix[w + 3]);
        LittleEndian::write_u32(&mut mix_hash[w..w + 4], reduced);
    }

    let mut finale = [0u8; NODE_BYTES + 32];
    finale[..NODE_BYTES].copy_from_slice(&seed);
    finale[NODE_BYTES..].copy_from_slice(&mix_hash);
    Ok(PowOutput {
        result: keccak256(&finale),
        mix_hash,
    })
}

/// Recompute the result digest from a stored `(header, nonce, mix)` triple
/// without touching the cache or dataset.
///
/// This is the final two steps of the mix starting from a trusted mix hash;
/// it lets block verifiers pre-screen nonces cheaply.
pub fn quick_hash(header_hash: &H256, nonce: u64, mix_hash: &H256) -> H256 {
    let mut buf = [0u8; 40];
    buf[..32].copy_from_slice(header_hash);
    LittleEndian::write_u64(&mut buf[32..40], nonce);
    let seed = keccak512(&buf);

    let mut finale = [0u8; NODE_BYTES + 32];
    finale[..NODE_BYTES].copy_from_slice(&seed);
    finale[NODE_BYTES..].copy_from_slice(mix_hash);
    keccak256(&finale)
}

/// Boundary pre-check for a stored triple: `quick_hash(..) <= boundary`.
pub fn quick_check_difficulty(
    header_hash: &H256,
    nonce: u64,
    mix_hash: &H256,
    boundary: &H256,
) -> bool {
    check_difficulty(&quick_hash(header_hash, nonce, mix_hash), boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::get_seedhash;
    use crate::dag::compute_full_data;

    // Reduced dataset sizes keep these tests fast; the real per-epoch sizes
    // are exercised by the client golden vectors.
    const SMALL_FULL_SIZE: u64 = 256 * MIX_BYTES as u64;

    fn small_cache() -> Cache {
        Cache::generate(&get_seedhash(0), 64 * NODE_BYTES as u64).unwrap()
    }

    #[test]
    fn light_and_full_sources_agree() {
        let cache = small_cache();
        let mut region = vec![0u8; SMALL_FULL_SIZE as usize];
        compute_full_data(&mut region, &cache, None).unwrap();
        let dataset: &[Node] = bytemuck::cast_slice(&region);

        let header = [0x42u8; 32];
        for nonce in [0u64, 1, 0xdead_beef, u64::MAX] {
            let light =
                hashimoto(&header, nonce, SMALL_FULL_SIZE, &DagSource::Light(&cache)).unwrap();
            let full =
                hashimoto(&header, nonce, SMALL_FULL_SIZE, &DagSource::Full(dataset)).unwrap();
            assert_eq!(light, full);
        }
    }

    #[test]
    fn quick_hash_matches_mix_result() {
        let cache = small_cache();
        let header = [0x07u8; 32];
        let nonce = 0x0123_4567_89ab_cdef;
        let out = hashimoto(&header, nonce, SMALL_FULL_SIZE, &DagSource::Light(&cache)).unwrap();
        assert_eq!(quick_hash(&header, nonce, &out.mix_hash), out.result);
    }

    #[test]
    fn quick_check_against_boundary() {
        let cache = small_cache();
        let header = [0u8; 32];
        let out = hashimoto(&header, 9, SMALL_FULL_SIZE, &DagSource::Light(&cache)).unwrap();

        let everything = [0xffu8; 32];
        assert!(quick_check_difficulty(&header, 9, &out.mix_hash, &everything));

        let nothing = [0u8; 32];
        assert!(!quick_check_difficulty(&header, 9, &out.mix_hash, &nothing));

        // the exact result is on the boundary
        assert!(quick_check_difficulty(&header, 9, &out.mix_hash, &out.result));
    }

    #[test]
    fn unaligned_dataset_size_is_rejected() {
        let cache = small_cache();
        assert!(matches!(
            hashimoto(&[0u8; 32], 0, MIX_BYTES as u64 + 1, &DagSource::Light(&cache)),
            Err(EtschashError::HashPrecondition(_))
        ));
    }

    #[test]
    fn nonce_is_packed_little_endian() {
        // one-byte nonces land in byte 32 of the seed buffer; flipping a
        // high-order byte must change the outcome
        let cache = small_cache();
        let a = hashimoto(&[0u8; 32], 1, SMALL_FULL_SIZE, &DagSource::Light(&cache)).unwrap();
        let b = hashimoto(&[0u8; 32], 1 << 56, SMALL_FULL_SIZE, &DagSource::Light(&cache)).unwrap();
        assert_ne!(a, b);
    }
}
