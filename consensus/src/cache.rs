//! Seedhash derivation and cache construction.
//!
//! The cache is the compact per-epoch structure every verifier needs: a
//! Keccak-512 chain seeded from the epoch seedhash, then three passes of
//! Sergio Lerner's SeqMemoHash randomising sweep. Light clients use it
//! directly; the full dataset is derived from it node by node.

use log::debug;

use etschash_crypto::{keccak256, keccak512};

use crate::node::{Node, H256, NODE_BYTES};
use crate::sizes::epoch;
use crate::EtschashError;

/// Randomising passes over the cache during construction.
pub const CACHE_ROUNDS: usize = 3;

/// Seedhash for the epoch of `block_number`: `epoch`-fold Keccak-256 of the
/// zero digest.
pub fn get_seedhash(block_number: u64) -> H256 {
    let mut seed = [0u8; 32];
    for _ in 0..epoch(block_number) {
        seed = keccak256(&seed);
    }
    seed
}

/// A per-epoch cache: a contiguous run of nodes, immutable once built.
pub struct Cache {
    nodes: Vec<Node>,
}

impl Cache {
    /// Derive the cache for `seed`.
    ///
    /// `cache_size` must be a multiple of the node size; construction is
    /// sequential by nature (each chain link and each sweep step depends on
    /// the previous one).
    pub fn generate(seed: &H256, cache_size: u64) -> Result<Self, EtschashError> {
        if cache_size == 0 || cache_size % NODE_BYTES as u64 != 0 {
            return Err(EtschashError::SizeInvariant {
                size: cache_size,
                unit: NODE_BYTES,
            });
        }
        let num_nodes = (cache_size / NODE_BYTES as u64) as usize;
        debug!(
            "generating cache: {} nodes ({} KiB)",
            num_nodes,
            cache_size / 1024
        );

        let mut nodes: Vec<Node> = Vec::new();
        nodes
            .try_reserve_exact(num_nodes)
            .map_err(|_| EtschashError::Allocation("cache"))?;

        nodes.push(Node {
            bytes: keccak512(seed),
        });
        for i in 1..num_nodes {
            let digest = keccak512(&nodes[i - 1].bytes);
            nodes.push(Node { bytes: digest });
        }

        for _ in 0..CACHE_ROUNDS {
            for i in 0..num_nodes {
                let idx = nodes[i].word(0) as usize % num_nodes;
                let prev = nodes[(i + num_nodes - 1) % num_nodes];
                let mut data = [0u8; NODE_BYTES];
                for (w, byte) in data.iter_mut().enumerate() {
                    *byte = prev.bytes[w] ^ nodes[idx].bytes[w];
                }
                nodes[i].bytes = keccak512(&data);
            }
        }

        // Word-level consumers read the bytes little-endian through the
        // Node accessors, so no host-order fixup pass is needed here.
        Ok(Cache { nodes })
    }

    /// The cache nodes.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total size in bytes.
    #[inline]
    pub fn size_bytes(&self) -> u64 {
        (self.nodes.len() * NODE_BYTES) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::EPOCH_LENGTH;

    #[test]
    fn seedhash_epoch_zero_is_zero() {
        assert_eq!(get_seedhash(0), [0u8; 32]);
        // constant across the whole epoch
        assert_eq!(get_seedhash(EPOCH_LENGTH - 1), [0u8; 32]);
    }

    #[test]
    fn seedhash_chains_by_keccak256() {
        let seed1 = get_seedhash(EPOCH_LENGTH);
        assert_eq!(seed1, keccak256(&[0u8; 32]));
        assert_eq!(
            hex::encode(seed1),
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        );
        assert_eq!(get_seedhash(2 * EPOCH_LENGTH), keccak256(&seed1));
    }

    #[test]
    fn cache_rejects_unaligned_size() {
        assert!(matches!(
            Cache::generate(&[0u8; 32], 100),
            Err(EtschashError::SizeInvariant { size: 100, .. })
        ));
    }

    #[test]
    fn small_cache_is_deterministic() {
        let seed = get_seedhash(0);
        let a = Cache::generate(&seed, 1024).unwrap();
        let b = Cache::generate(&seed, 1024).unwrap();
        assert_eq!(a.len(), 16);
        assert_eq!(a.size_bytes(), 1024);
        assert_eq!(a.nodes(), b.nodes());

        // a different seed reshuffles everything
        let c = Cache::generate(&keccak256(&seed), 1024).unwrap();
        assert_ne!(a.nodes(), c.nodes());
    }
}
