//! Cryptographic primitives for the etschash proof of work
//!
//! Etschash predates FIPS-202: both digests here are the original Keccak
//! with multi-rate padding byte `0x01`, not the standardised SHA-3 (`0x06`).
//! The `sha3` crate's `Keccak256`/`Keccak512` types are exactly that
//! variant; the `Sha3_*` types are not interchangeable with them.

use sha3::{Digest, Keccak256, Keccak512};

/// Multiplier of the 32-bit FNV-1 step.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Keccak-256 digest of `data` (original padding).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Keccak-512 digest of `data` (original padding).
pub fn keccak512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Keccak512::digest(data));
    out
}

/// One FNV-1 mixing step: `(x * FNV_PRIME) XOR y`, wrapping mod 2^32.
#[inline(always)]
pub fn fnv(x: u32, y: u32) -> u32 {
    x.wrapping_mul(FNV_PRIME) ^ y
}
