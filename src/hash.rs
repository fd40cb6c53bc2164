//! Key to 32-bit hash functions.
//!
//! A map holds exactly one hashing function, chosen at construction. Any
//! `Fn(&K) -> u32` works as long as it is deterministic; the functions here
//! cover byte-like keys (FNV) and everything else that implements `Hash`
//! (FoldHash with a fixed seed).

use core::hash::{BuildHasher, Hash};
use foldhash::fast::FixedState;

const OFFSET_BASIS: u32 = 2_166_136_261;
const PRIME: u32 = 16_777_619;

/// 32-bit FNV hash of a byte slice.
///
/// For each byte the accumulator is multiplied by the FNV prime, then the
/// byte is XORed in.
#[inline]
pub fn fnv32(bytes: &[u8]) -> u32 {
    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash = hash.wrapping_mul(PRIME);
        hash ^= u32::from(byte);
    }
    hash
}

/// Default hasher for string-like keys (`String`, `&str`, `Vec<u8>`, ...).
#[inline]
pub fn fnv32_key<K>(key: &K) -> u32
where
    K: AsRef<[u8]> + ?Sized,
{
    fnv32(key.as_ref())
}

/// Hasher for arbitrary `Hash` keys.
///
/// Uses FoldHash with a fixed seed so the same key always lands in the same
/// bucket, across maps and across runs.
#[inline]
pub fn fold32<K>(key: &K) -> u32
where
    K: Hash + ?Sized,
{
    let hash = FixedState::default().hash_one(key);
    // fold the high half in, modulo only sees the low 32 bits otherwise
    (hash ^ (hash >> 32)) as u32
}
