//! Light and full proof-of-work clients.
//!
//! A [`Light`] owns the per-epoch cache and derives dataset nodes as the
//! mix touches them; it needs tens of megabytes and suits verifiers. A
//! [`Full`] materialises the whole dataset into a memory-mapped file once
//! and reads it directly; it needs gigabytes and suits miners. Both are
//! read-only after construction and safe to share across threads.

use std::path::Path;

use log::{debug, info};

use crate::cache::{get_seedhash, Cache};
use crate::dag::compute_full_data;
use crate::dagfile::DagFile;
use crate::hashimoto::{hashimoto, DagSource, PowOutput};
use crate::node::{Node, H256};
use crate::sizes::{epoch, get_cache_size, get_data_size};
use crate::EtschashError;

/// Light client: a cache, plus on-demand dataset derivation.
pub struct Light {
    block_number: u64,
    cache: Cache,
}

impl Light {
    /// Build the cache for the epoch of `block_number`.
    pub fn new(block_number: u64) -> Result<Self, EtschashError> {
        let cache_size = get_cache_size(block_number)?;
        let seed = get_seedhash(block_number);
        info!(
            "building light client for epoch {} ({} MiB cache)",
            epoch(block_number),
            cache_size / (1024 * 1024)
        );
        let cache = Cache::generate(&seed, cache_size)?;
        Ok(Light {
            block_number,
            cache,
        })
    }

    /// Block number this client was built for.
    #[inline]
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// The epoch cache.
    #[inline]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Evaluate the mix for `(header_hash, nonce)`, deriving every touched
    /// dataset node from the cache.
    pub fn compute(&self, header_hash: &H256, nonce: u64) -> Result<PowOutput, EtschashError> {
        let full_size = get_data_size(self.block_number)?;
        self.compute_with_size(full_size, header_hash, nonce)
    }

    // seam for driving the light path at reduced dataset sizes in tests
    pub(crate) fn compute_with_size(
        &self,
        full_size: u64,
        header_hash: &H256,
        nonce: u64,
    ) -> Result<PowOutput, EtschashError> {
        hashimoto(header_hash, nonce, full_size, &DagSource::Light(&self.cache))
    }
}

/// Full client: the materialised, mmap-backed dataset.
pub struct Full {
    block_number: u64,
    full_size: u64,
    file: DagFile,
}

impl Full {
    /// Open the epoch's DAG file under `dir`, generating the dataset from
    /// `light`'s cache if no complete file exists yet.
    ///
    /// Generation reports through `progress` at each percent boundary; a
    /// `false` return cancels, leaving no finalised file behind. The light
    /// client is only read during construction and stays usable.
    pub fn new(
        light: &Light,
        dir: &Path,
        progress: Option<&mut dyn FnMut(u32) -> bool>,
    ) -> Result<Self, EtschashError> {
        let block_number = light.block_number();
        let full_size = get_data_size(block_number)?;
        let seed = get_seedhash(block_number);

        let (mut file, needs_data) = DagFile::open(dir, &seed, full_size)?;
        if needs_data {
            info!(
                "generating {} MiB dataset for epoch {}",
                full_size / (1024 * 1024),
                epoch(block_number)
            );
            compute_full_data(file.body_mut(), light.cache(), progress)?;
            file.finalize()?;
            info!("dataset for epoch {} complete", epoch(block_number));
        } else {
            debug!("reusing complete dataset for epoch {}", epoch(block_number));
        }

        Ok(Full {
            block_number,
            full_size,
            file,
        })
    }

    /// Block number this client was built for.
    #[inline]
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// The materialised dataset.
    #[inline]
    pub fn dag(&self) -> &[Node] {
        self.file.body()
    }

    /// Dataset size in bytes.
    #[inline]
    pub fn dag_size(&self) -> u64 {
        self.full_size
    }

    /// Evaluate the mix for `(header_hash, nonce)` against the dataset.
    pub fn compute(&self, header_hash: &H256, nonce: u64) -> Result<PowOutput, EtschashError> {
        hashimoto(
            header_hash,
            nonce,
            self.full_size,
            &DagSource::Full(self.file.body()),
        )
    }
}
