//! [`Error`] types.

use thiserror::Error;

/// Errors reported by the maps in this crate.
///
/// A missing key or value is never an error; lookups and removals return `None` instead.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum Error {
    /// The load factor is zero, negative, or not a number.
    #[error("illegal load factor: {0}")]
    IllegalLoadFactor(f32),

    /// The key range of a keygen map is negative or empty.
    #[error("illegal key range: start key {start_key}, max key {max_key}")]
    IllegalKeyRange {
        /// The first key to be generated.
        start_key: i32,
        /// The exclusive upper bound of generated keys.
        max_key: i32,
    },

    /// A counter operation that requires a strictly positive amount received something else.
    #[error("amount must be strictly positive")]
    NonPositiveAmount,

    /// The key was required to be absent but already has a mapping.
    #[error("the key is already mapped")]
    DuplicateKey,

    /// The iterator has no more entries to return.
    #[error("the iterator is exhausted")]
    Exhausted,

    /// `remove` was called on an iterator without a preceding `next`.
    #[error("no entry to remove: `next` has not been called since the last removal or rewind")]
    NoCurrentEntry,
}
