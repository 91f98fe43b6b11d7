//! Dataset derivation: the per-node function and full materialisation.
//!
//! Every dataset node is a pure function of the cache and its index, so the
//! full dataset can be filled in any order; materialisation fans the work
//! across a thread pool one percent-slice at a time, which keeps progress
//! reporting serialised and cancellation prompt.

use log::debug;
use rayon::prelude::*;

use etschash_crypto::{fnv, keccak512};

use crate::cache::Cache;
use crate::hashimoto::MIX_BYTES;
use crate::node::{Node, NODE_WORDS};
use crate::EtschashError;

/// Cache lookups mixed into every dataset node.
pub const DATASET_PARENTS: u32 = 256;

/// Derive dataset node `index` from the cache.
pub fn calc_dataset_item(cache: &Cache, index: u32) -> Node {
    let nodes = cache.nodes();
    let num_parents = nodes.len() as u32;

    let mut ret = nodes[(index % num_parents) as usize];
    ret.set_word(0, ret.word(0) ^ index);
    ret.bytes = keccak512(&ret.bytes);

    let mut mix = ret.words();
    for i in 0..DATASET_PARENTS {
        let parent = fnv(index ^ i, mix[i as usize % NODE_WORDS]) % num_parents;
        let parent_words = nodes[parent as usize].words();
        for (m, p) in mix.iter_mut().zip(parent_words.iter()) {
            *m = fnv(*m, *p);
        }
    }
    ret.set_words(&mix);

    ret.bytes = keccak512(&ret.bytes);
    ret
}

/// Populate `dest` with the full dataset derived from `cache`.
///
/// `dest` must span the whole dataset (a multiple of the 128-byte page
/// size). `progress`, when given, is called with a percentage before each
/// 1% slice and once at completion; returning `false` aborts the fill with
/// [`EtschashError::Cancelled`]. Invocations are serialised and the
/// percentage never decreases.
pub fn compute_full_data(
    dest: &mut [u8],
    cache: &Cache,
    mut progress: Option<&mut dyn FnMut(u32) -> bool>,
) -> Result<(), EtschashError> {
    let full_size = dest.len() as u64;
    if full_size % MIX_BYTES as u64 != 0 {
        return Err(EtschashError::SizeInvariant {
            size: full_size,
            unit: MIX_BYTES,
        });
    }

    let nodes: &mut [Node] = bytemuck::cast_slice_mut(dest);
    let total = nodes.len();
    let step = (total / 100).max(1);
    debug!("computing {} dataset nodes in slices of {}", total, step);

    let mut start = 0usize;
    while start < total {
        if let Some(cb) = progress.as_mut() {
            let pct = (start as u64 * 100 / total as u64) as u32;
            if !cb(pct) {
                return Err(EtschashError::Cancelled);
            }
        }
        let end = (start + step).min(total);
        let base = start as u32;
        nodes[start..end]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, node)| *node = calc_dataset_item(cache, base + i as u32));
        start = end;
    }

    if let Some(cb) = progress.as_mut() {
        if !cb(100) {
            return Err(EtschashError::Cancelled);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::get_seedhash;
    use crate::node::NODE_BYTES;

    fn small_cache() -> Cache {
        Cache::generate(&get_seedhash(0), 64 * NODE_BYTES as u64).unwrap()
    }

    #[test]
    fn dataset_item_is_deterministic() {
        let cache = small_cache();
        assert_eq!(calc_dataset_item(&cache, 0), calc_dataset_item(&cache, 0));
        assert_ne!(calc_dataset_item(&cache, 0), calc_dataset_item(&cache, 1));
    }

    #[test]
    fn full_data_matches_per_item_derivation() {
        let cache = small_cache();
        let mut region = vec![0u8; 16 * MIX_BYTES];
        compute_full_data(&mut region, &cache, None).unwrap();

        let nodes: &[Node] = bytemuck::cast_slice(&region);
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(*node, calc_dataset_item(&cache, i as u32));
        }
    }

    #[test]
    fn unaligned_region_is_rejected() {
        let cache = small_cache();
        let mut region = vec![0u8; MIX_BYTES + NODE_BYTES];
        assert!(matches!(
            compute_full_data(&mut region, &cache, None),
            Err(EtschashError::SizeInvariant { .. })
        ));
    }

    #[test]
    fn progress_is_monotonic_and_reaches_completion() {
        let cache = small_cache();
        let mut region = vec![0u8; 32 * MIX_BYTES];
        let mut seen: Vec<u32> = Vec::new();
        let mut cb = |pct: u32| {
            seen.push(pct);
            true
        };
        compute_full_data(&mut region, &cache, Some(&mut cb)).unwrap();

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn callback_cancels_midway() {
        let cache = small_cache();
        let mut region = vec![0u8; 32 * MIX_BYTES];
        let mut cb = |pct: u32| pct < 50;
        assert!(matches!(
            compute_full_data(&mut region, &cache, Some(&mut cb)),
            Err(EtschashError::Cancelled)
        ));
    }
}
