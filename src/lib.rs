//! Concurrent hash maps specialized for primitive keys.
//!
//! # primitive_maps::HashTable
//! A chained hash table whose readers never acquire a lock, and whose writers serialize on a
//! single mutex. Every map of the crate is a [`HashTable`] instantiated with a [`KeyStrategy`]
//! and a [`ValueKind`].
//!
//! # primitive_maps::KeygenMap
//! An `i32`-keyed map that generates the keys of the values inserted into it.
//!
//! # Reusable iterators and views
//! [`ReusableIter`] is a cursor that can be rewound and driven through any number of scans, and
//! [`KeySet`], [`Values`] and [`EntrySet`] are live views of a [`HashTable`].

mod config;
pub use config::{Config, KeygenConfig, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MAXIMUM_CAPACITY};

mod error;
pub use error::Error;

pub mod key;
pub use key::{ByteKey, IntKey, KeyStrategy, LongKey};

pub mod value;
pub use value::{Counter, IntCounter, LongCounter, ObjectValue, ValueKind};

mod hash_table;
pub use hash_table::HashTable;

pub mod iter;
pub use iter::{EntryIter, KeyIter, ReusableIter, ValueIter};

pub mod view;
pub use view::{EntrySet, KeySet, Values};

mod keygen_map;
pub use keygen_map::{KeySetter, KeygenMap};

mod map_info;
pub use map_info::MapInfo;

#[cfg(feature = "serde")]
mod serde;

pub use sdd::{Guard, Shared};

/// `i32` keys mapped to arbitrary values.
pub type IntHashMap<V> = HashTable<IntKey, ObjectValue<V>>;

/// `i64` keys mapped to arbitrary values.
pub type LongHashMap<V> = HashTable<LongKey, ObjectValue<V>>;

/// Byte-sequence keys mapped to arbitrary values.
pub type ByteArrayHashMap<V> = HashTable<ByteKey, ObjectValue<V>>;

/// `i64` keys mapped to `i32` counters.
pub type LongIntCounterMap = HashTable<LongKey, IntCounter>;

/// `i32` keys mapped to `i64` counters.
pub type IntLongCounterMap = HashTable<IntKey, LongCounter>;

/// `i64` keys mapped to `i64` counters.
pub type LongLongCounterMap = HashTable<LongKey, LongCounter>;
