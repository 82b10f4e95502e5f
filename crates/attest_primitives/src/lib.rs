#![forbid(unsafe_code)]
#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

//! Profile attestation primitives: tagged hashing and fixed-width
//! little-endian encodings.
#![cfg_attr(not(feature = "std"), no_std)]
//
// Used by the message codec and the hashers:
//
// - Domain-tagged SHA3-256 with length framing
// - Fixed-width little-endian integer encodings

use sha3::{Digest, Sha3_256};

/// 32-byte hash (SHA3-256 or BLAKE3 output).
pub type Hash256 = [u8; 32];

/// 32-byte public key (Ed25519).
pub type Pk32 = [u8; 32];

pub mod constants;

/// Convert an unsigned integer to fixed-width little-endian bytes.
///
/// The output is exactly `W` bytes (no overlong encodings). Bits above `8 * W`
/// are discarded.
#[must_use]
pub fn le_bytes<const W: usize>(mut x: u128) -> [u8; W] {
    let mut out = [0u8; W];
    let mut i = 0usize;
    while i < W {
        out[i] = (x & 0xFF) as u8;
        x >>= 8;
        i += 1;
    }
    out
}

/// Read a `u32` from the first 4 bytes of a little-endian byte slice.
/// Shorter input is zero-extended.
#[must_use]
pub fn u32_from_le(b: &[u8]) -> u32 {
    let mut x: u32 = 0;
    let mut i = 0usize;
    while i < 4 && i < b.len() {
        x |= u32::from(b[i]) << (8 * i as u32);
        i += 1;
    }
    x
}

/// Domain-tagged SHA3-256 with length framing:
/// `H(tag_ascii, parts[])` = `SHA3_256`( UTF8(tag) || Σ ( LE(|p|,8) || p ) )
#[must_use]
pub fn h_tag(tag: &str, parts: &[&[u8]]) -> Hash256 {
    debug_assert!(
        tag.starts_with("attest."),
        "non-attest.* tag used in tagged hashing: {tag}"
    );
    let mut hasher = Sha3_256::new();
    hasher.update(tag.as_bytes());
    for p in parts {
        let len_le = le_bytes::<8>(p.len() as u128);
        hasher.update(len_le);
        hasher.update(p);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
