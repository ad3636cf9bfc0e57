//! Construction parameters of the maps.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// The largest bucket array length; bucket indexes must stay representable as `i32`.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// The default number of buckets.
pub const DEFAULT_CAPACITY: usize = 16;

/// The default ratio of entries to buckets that triggers a rehash.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Sizing parameters of a hash table.
///
/// # Examples
///
/// ```
/// use primitive_maps::{Config, IntHashMap};
///
/// let config = Config {
///     initial_capacity: 4,
///     load_factor: 0.75,
/// };
/// let map: IntHashMap<u64> = IntHashMap::with_config(config).unwrap();
/// assert_eq!(map.capacity(), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// The minimum number of buckets; rounded up to a power of two.
    pub initial_capacity: usize,

    /// The ratio of entries to buckets above which the bucket array doubles.
    pub load_factor: f32,
}

impl Config {
    /// Checks that the parameters describe a valid table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalLoadFactor`] if the load factor is not a positive number.
    #[inline]
    pub fn validate(&self) -> Result<(), Error> {
        if self.load_factor > 0.0 && self.load_factor.is_finite() {
            Ok(())
        } else {
            Err(Error::IllegalLoadFactor(self.load_factor))
        }
    }

    /// Returns the bucket array length for the initial capacity.
    #[inline]
    pub(crate) const fn table_len(&self) -> usize {
        table_len_for(self.initial_capacity)
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

/// Sizing and key range of a [`KeygenMap`](crate::KeygenMap).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeygenConfig {
    /// The first generated key, and the key generation wraps back to.
    pub start_key: i32,

    /// The exclusive upper bound of generated keys.
    pub max_key: i32,

    /// Sizing of the underlying table.
    pub table: Config,
}

impl KeygenConfig {
    /// Checks that the key range is non-empty and non-negative, and the table parameters are
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalKeyRange`] or [`Error::IllegalLoadFactor`].
    #[inline]
    pub fn validate(&self) -> Result<(), Error> {
        if self.start_key < 0 || self.max_key < 0 || self.start_key >= self.max_key {
            return Err(Error::IllegalKeyRange {
                start_key: self.start_key,
                max_key: self.max_key,
            });
        }
        self.table.validate()
    }
}

impl Default for KeygenConfig {
    #[inline]
    fn default() -> Self {
        Self {
            start_key: 0,
            max_key: i32::MAX,
            table: Config::default(),
        }
    }
}

/// Rounds the capacity up to a power of two within `[1, MAXIMUM_CAPACITY]`.
#[inline]
pub(crate) const fn table_len_for(capacity: usize) -> usize {
    if capacity >= MAXIMUM_CAPACITY {
        MAXIMUM_CAPACITY
    } else {
        capacity.next_power_of_two()
    }
}

/// Caps the initial capacity derived from an untrusted size hint.
#[inline]
pub(crate) fn capacity_from_size_hint(size_hint: Option<usize>) -> usize {
    size_hint.unwrap_or(0).min(DEFAULT_CAPACITY * 1024)
}

/// Computes `floor(table_len * load_factor)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#[inline]
pub(crate) fn threshold_for(table_len: usize, load_factor: f32) -> usize {
    (table_len as f64 * f64::from(load_factor)) as usize
}
