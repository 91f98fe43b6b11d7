//! On-disk DAG files: seed-keyed naming, mmap lifecycle and the magic tag.
//!
//! A persisted dataset is `8 + dataset_size` bytes: an 8-byte magic number
//! followed by the flat node array. The magic is written only after the
//! whole body, so it is the single on-disk signal that a file is complete;
//! a process killed mid-generation leaves a file that re-classifies as
//! incomplete and gets regenerated.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use memmap2::MmapMut;

use crate::node::{Node, H256, NODE_BYTES};
use crate::EtschashError;

/// Tag marking a fully written DAG file, stored little-endian in its first
/// eight bytes.
pub const DAG_MAGIC: u64 = 0xFEE1_DEAD_BADD_CAFE;

/// Size of the magic tag in bytes; the DAG body starts at this offset.
pub const DAG_MAGIC_BYTES: usize = 8;

/// Dataset format revision, part of the file name.
pub const REVISION: u32 = 23;

/// Default directory for DAG files: `~/.etschash`, falling back to the
/// system temp directory.
pub fn default_dag_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(".etschash"),
        _ => std::env::temp_dir().join("etschash"),
    }
}

/// File name for the dataset keyed by `seed`: revision plus the first
/// eight bytes of the seed hash.
fn dag_file_name(seed: &H256) -> String {
    format!("full-R{}-{}", REVISION, hex::encode(&seed[..8]))
}

/// Classification of an existing (or freshly created) DAG file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prepare {
    /// Magic present and size exactly `body + 8`: body is usable as-is.
    Match,
    /// A file of the same name but a different size.
    SizeMismatch,
    /// A fresh file of the right size whose body still has to be written.
    Mismatch,
}

/// Open (creating if needed) the DAG file for `seed` under `dir` and
/// classify it against the expected body size.
pub(crate) fn prepare(
    dir: &Path,
    seed: &H256,
    body_size: u64,
    force_recreate: bool,
) -> Result<(File, Prepare), EtschashError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(dag_file_name(seed));
    let want_len = body_size + DAG_MAGIC_BYTES as u64;

    if !force_recreate && path.exists() {
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if len != want_len {
            debug!(
                "DAG file {} has size {len}, expected {want_len}",
                path.display()
            );
            return Ok((file, Prepare::SizeMismatch));
        }
        file.seek(SeekFrom::Start(0))?;
        let mut tag = [0u8; DAG_MAGIC_BYTES];
        file.read_exact(&mut tag)?;
        if LittleEndian::read_u64(&tag) == DAG_MAGIC {
            return Ok((file, Prepare::Match));
        }
        warn!(
            "DAG file {} has no magic tag, regenerating",
            path.display()
        );
        // right size but never finalised (or foreign): fall through and recreate
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)?;
    file.set_len(want_len)?;
    Ok((file, Prepare::Mismatch))
}

/// A memory-mapped DAG file.
///
/// Owns the map and the file handle as one bundle; dropping it unmaps and
/// closes without deleting the file.
pub struct DagFile {
    // declared before `file` so the mapping is torn down first
    map: MmapMut,
    file: File,
}

impl DagFile {
    /// Open or create the DAG file for `seed` in `dir`, mapping
    /// `body_size + 8` bytes read-write.
    ///
    /// Returns the mapped file and whether the body still has to be
    /// generated. An existing file with a wrong size is recreated once; if
    /// the recreated file does not come back empty the file is treated as
    /// corrupt.
    pub fn open(dir: &Path, seed: &H256, body_size: u64) -> Result<(Self, bool), EtschashError> {
        if body_size % NODE_BYTES as u64 != 0 {
            return Err(EtschashError::SizeInvariant {
                size: body_size,
                unit: NODE_BYTES,
            });
        }

        let (file, outcome) = prepare(dir, seed, body_size, false)?;
        let (file, outcome) = match outcome {
            Prepare::SizeMismatch => {
                let (file, retried) = prepare(dir, seed, body_size, true)?;
                if retried != Prepare::Mismatch {
                    return Err(EtschashError::FileCorrupt(format!(
                        "could not recreate DAG file for seed {} after size mismatch",
                        hex::encode(&seed[..8])
                    )));
                }
                (file, Prepare::Mismatch)
            }
            other => (file, other),
        };

        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok((DagFile { map, file }, outcome == Prepare::Mismatch))
    }

    /// The DAG body as nodes, past the magic header.
    #[inline]
    pub fn body(&self) -> &[Node] {
        bytemuck::cast_slice(&self.map[DAG_MAGIC_BYTES..])
    }

    /// The raw DAG body for generation.
    #[inline]
    pub(crate) fn body_mut(&mut self) -> &mut [u8] {
        &mut self.map[DAG_MAGIC_BYTES..]
    }

    /// Body size in bytes.
    #[inline]
    pub fn body_size(&self) -> u64 {
        (self.map.len() - DAG_MAGIC_BYTES) as u64
    }

    /// Stamp the magic tag and flush the mapping.
    ///
    /// Must only be called once the body is fully written; the tag is what
    /// later opens trust.
    pub fn finalize(&mut self) -> Result<(), EtschashError> {
        LittleEndian::write_u64(&mut self.map[..DAG_MAGIC_BYTES], DAG_MAGIC);
        self.map.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}
