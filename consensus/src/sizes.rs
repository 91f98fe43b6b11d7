//! Per-epoch sizing of the cache and dataset.
//!
//! Sizes come from embedded tables covering epochs `[0, 2048)`. Each entry
//! is the geometric growth formula trimmed down until the node (cache) or
//! page (dataset) count is prime, which spreads the modulo-indexed accesses
//! evenly. Blocks beyond the last tabulated epoch are rejected.

use crate::data_sizes::{CACHE_SIZES, DAG_SIZES, MAX_EPOCH};
use crate::EtschashError;

/// Number of consecutive blocks sharing one seedhash, cache and dataset.
pub const EPOCH_LENGTH: u64 = 30000;

/// Epoch of a block number.
#[inline]
pub fn epoch(block_number: u64) -> u64 {
    block_number / EPOCH_LENGTH
}

/// Cache size in bytes for the epoch of `block_number`.
pub fn get_cache_size(block_number: u64) -> Result<u64, EtschashError> {
    let e = epoch(block_number);
    if e >= MAX_EPOCH {
        return Err(EtschashError::EpochOutOfRange(e));
    }
    Ok(CACHE_SIZES[e as usize])
}

/// Dataset size in bytes for the epoch of `block_number`.
pub fn get_data_size(block_number: u64) -> Result<u64, EtschashError> {
    let e = epoch(block_number);
    if e >= MAX_EPOCH {
        return Err(EtschashError::EpochOutOfRange(e));
    }
    Ok(DAG_SIZES[e as usize])
}
