//! Key hashing and equality strategies.
//!
//! A map is bound to exactly one [`KeyStrategy`] at the type level, so the two hashing
//! disciplines are never mixed within one table.

use std::sync::Arc;

/// Hashing and equality of the keys stored in a map.
///
/// `Probe` is the borrowed form used for lookups, e.g., `[u8]` for byte-sequence keys.
pub trait KeyStrategy: 'static {
    /// The key type stored in entries.
    type Key: Clone + Send + Sync + 'static;

    /// The borrowed form of a key used for lookups.
    type Probe: ?Sized;

    /// Borrows the lookup form of a stored key.
    fn probe(key: &Self::Key) -> &Self::Probe;

    /// Computes the hash of a key; the bucket index is `hash & (len - 1)`.
    fn hash(probe: &Self::Probe) -> u32;

    /// Returns `true` if the probe designates the stored key.
    fn matches(probe: &Self::Probe, key: &Self::Key) -> bool;
}

/// `i32` keys that are their own hash.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntKey;

/// `i64` keys hashed by their low 32 bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct LongKey;

/// Byte-sequence keys compared by content.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteKey;

impl KeyStrategy for IntKey {
    type Key = i32;
    type Probe = i32;

    #[inline]
    fn probe(key: &i32) -> &i32 {
        key
    }

    #[allow(clippy::cast_sign_loss)]
    #[inline]
    fn hash(probe: &i32) -> u32 {
        *probe as u32
    }

    #[inline]
    fn matches(probe: &i32, key: &i32) -> bool {
        probe == key
    }
}

impl KeyStrategy for LongKey {
    type Key = i64;
    type Probe = i64;

    #[inline]
    fn probe(key: &i64) -> &i64 {
        key
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[inline]
    fn hash(probe: &i64) -> u32 {
        // Intended truncation.
        *probe as u32
    }

    #[inline]
    fn matches(probe: &i64, key: &i64) -> bool {
        probe == key
    }
}

impl KeyStrategy for ByteKey {
    type Key = Arc<[u8]>;
    type Probe = [u8];

    #[inline]
    fn probe(key: &Arc<[u8]>) -> &[u8] {
        key
    }

    #[inline]
    fn hash(probe: &[u8]) -> u32 {
        spread(content_hash(probe))
    }

    #[inline]
    fn matches(probe: &[u8], key: &Arc<[u8]>) -> bool {
        probe == &**key
    }
}

/// Polynomial content hash over signed bytes: `h = 31 * h + b`, starting from `1`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
#[inline]
pub(crate) fn content_hash(bytes: &[u8]) -> u32 {
    bytes.iter().fold(1_u32, |h, &b| {
        h.wrapping_mul(31).wrapping_add(i32::from(b as i8) as u32)
    })
}

/// Supplemental mixing applied to byte-sequence hashes.
///
/// Power-of-two tables only look at the low bits of a hash; this folds the upper bits down so
/// that hashes differing only in their upper bits land in different buckets.
#[inline]
pub(crate) const fn spread(mut h: u32) -> u32 {
    h ^= (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}
