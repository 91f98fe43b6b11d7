//! ETSC Proof-of-Work Engine
//!
//! This crate implements etschash, the memory-hard proof of work of the
//! ETSC chain. Every 30,000-block epoch has a seedhash, a compact cache
//! derived from it, and a gigabyte-scale dataset derived from the cache.
//! The hashimoto mix binds a block header and nonce to 64 pseudo-random
//! dataset page reads; a nonce is accepted when the resulting digest is
//! numerically below the difficulty boundary.
//!
//! [`Light`] owns a cache and derives dataset nodes on demand (slow, small).
//! [`Full`] materialises the whole dataset once into a memory-mapped file
//! and reads it directly (fast, large). Both produce bit-identical output.

use thiserror::Error;

pub mod cache;
pub mod client;
pub mod dag;
mod data_sizes;
pub mod dagfile;
pub mod hashimoto;
pub mod node;
pub mod sizes;

pub use cache::{get_seedhash, Cache, CACHE_ROUNDS};
pub use client::{Full, Light};
pub use dag::{calc_dataset_item, compute_full_data, DATASET_PARENTS};
pub use dagfile::{default_dag_dir, DagFile, DAG_MAGIC, REVISION};
pub use data_sizes::MAX_EPOCH;
pub use hashimoto::{
    quick_check_difficulty, quick_hash, PowOutput, ACCESSES, MIX_BYTES, MIX_WORDS,
};
pub use node::{check_difficulty, Node, H256, NODE_BYTES, NODE_WORDS};
pub use sizes::{epoch, get_cache_size, get_data_size, EPOCH_LENGTH};

/// Etschash engine errors
#[derive(Debug, Error)]
pub enum EtschashError {
    /// A cache or dataset size that is not node/page aligned.
    #[error("size {size} is not a multiple of {unit} bytes")]
    SizeInvariant { size: u64, unit: usize },

    /// Block number beyond the tabulated epochs.
    #[error("epoch {0} is beyond the tabulated range")]
    EpochOutOfRange(u64),

    /// Out of memory while building a cache.
    #[error("allocation failed for {0}")]
    Allocation(&'static str),

    /// Dataset size handed to hashimoto is not page aligned.
    #[error("dataset size {0} is not a multiple of the mix page size")]
    HashPrecondition(u64),

    /// An on-disk DAG file that cannot be brought to a usable state.
    #[error("DAG file is corrupt: {0}")]
    FileCorrupt(String),

    /// The progress callback requested an abort.
    #[error("DAG generation cancelled by caller")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
