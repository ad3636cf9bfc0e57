//! [`HashTable`] is the chained hash table engine behind every map of the crate.

pub(crate) mod bucket_array;
pub(crate) mod entry;

use std::fmt::{self, Debug};
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::PoisonError;

#[cfg(feature = "loom")]
use loom::sync::atomic::AtomicUsize;
#[cfg(feature = "loom")]
use loom::sync::{Mutex, MutexGuard};
#[cfg(not(feature = "loom"))]
use std::sync::atomic::AtomicUsize;
#[cfg(not(feature = "loom"))]
use std::sync::{Mutex, MutexGuard};

use sdd::{AtomicShared, Guard, Shared, Tag};

use crate::config::{
    table_len_for, threshold_for, Config, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR,
    MAXIMUM_CAPACITY,
};
use crate::iter::{EntryIter, KeyIter, ReusableIter, ValueIter};
use crate::key::KeyStrategy;
use crate::map_info::MapInfo;
use crate::value::{Counter, ValueKind};
use crate::view::{EntrySet, KeySet, Values};
use crate::Error;
use bucket_array::BucketArray;
use entry::Entry;

/// Concurrent chained hash table.
///
/// Readers never acquire a lock: they load the entry count, and if it is non-zero, traverse the
/// current bucket array. Writers serialize on a single mutex; they never modify a bucket chain
/// in place, instead they publish a new chain head, so a reader that is walking a chain or a
/// superseded bucket array always observes a consistent state. Superseded arrays and unlinked
/// entries are reclaimed once no [`Guard`] can reach them.
///
/// The key type and value shape are chosen by the `S` and `C` type parameters; the crate exports
/// type aliases for the supported combinations, e.g., [`IntHashMap`](crate::IntHashMap).
///
/// # Examples
///
/// ```
/// use primitive_maps::IntHashMap;
///
/// let map: IntHashMap<String> = IntHashMap::new();
///
/// assert!(map.put(1, "one".to_owned()).is_none());
/// assert_eq!(map.get(&1).as_deref().map(String::as_str), Some("one"));
/// assert_eq!(map.len(), 1);
/// ```
pub struct HashTable<S: KeyStrategy, C: ValueKind> {
    array: AtomicShared<BucketArray<S, C>>,
    len: AtomicUsize,
    initial_len: usize,
    load_factor: f32,

    /// The writer lock, protecting the resize threshold.
    threshold: Mutex<usize>,
}

impl<S: KeyStrategy, C: ValueKind> HashTable<S, C> {
    /// Creates an empty [`HashTable`] with the default capacity and load factor.
    ///
    /// No memory is allocated until the first entry is inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u64> = IntHashMap::new();
    /// assert_eq!(map.capacity(), 16);
    /// assert!(map.is_empty());
    /// ```
    #[cfg(not(feature = "loom"))]
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty [`HashTable`] with the default capacity and load factor.
    #[cfg(feature = "loom")]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty [`HashTable`] with at least the specified capacity.
    ///
    /// The capacity is rounded up to a power of two, and clamped to
    /// [`MAXIMUM_CAPACITY`](crate::MAXIMUM_CAPACITY).
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u64> = IntHashMap::with_capacity(1000);
    /// assert_eq!(map.capacity(), 1024);
    ///
    /// let map: IntHashMap<u64> = IntHashMap::with_capacity(0);
    /// assert_eq!(map.capacity(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(table_len_for(capacity), DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty [`HashTable`] with the specified capacity and load factor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalLoadFactor`] if the load factor is not a positive number.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::{Error, IntHashMap};
    ///
    /// let map: IntHashMap<u64> = IntHashMap::with_capacity_and_load_factor(4, 0.75).unwrap();
    /// assert_eq!(map.capacity(), 4);
    ///
    /// let result = IntHashMap::<u64>::with_capacity_and_load_factor(4, 0.0);
    /// assert_eq!(result.err(), Some(Error::IllegalLoadFactor(0.0)));
    /// ```
    #[inline]
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self, Error> {
        Self::with_config(Config {
            initial_capacity: capacity,
            load_factor,
        })
    }

    /// Creates an empty [`HashTable`] from a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if the [`Config`] is invalid.
    #[inline]
    pub fn with_config(config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::from_parts(config.table_len(), config.load_factor))
    }

    /// Returns the number of entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u64> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Acquire)
    }

    /// Returns `true` if the [`HashTable`] is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u64> = IntHashMap::with_capacity_and_load_factor(4, 0.75).unwrap();
    ///
    /// for key in 1..=3 {
    ///     assert!(map.put(key, 0).is_none());
    /// }
    /// assert_eq!(map.capacity(), 4);
    ///
    /// assert!(map.put(4, 0).is_none());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        let guard = Guard::new();
        let capacity = self
            .array
            .load(Acquire, &guard)
            .as_ref()
            .map_or(self.initial_len, BucketArray::len);
        capacity
    }

    /// Returns the load factor.
    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns the value associated with the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u64> = IntHashMap::new();
    ///
    /// assert!(map.get(&1).is_none());
    /// assert!(map.put(1, 10).is_none());
    /// assert_eq!(map.get(&1).map(|v| *v), Some(10));
    /// ```
    #[inline]
    pub fn get(&self, key: &S::Probe) -> Option<C::Output> {
        if self.len.load(Acquire) == 0 {
            return None;
        }
        let guard = Guard::new();
        let entry = self.find(key, S::hash(key), &guard)?;
        self.load_value(entry, &guard)
    }

    /// Returns `true` if the key exists.
    #[inline]
    pub fn contains_key(&self, key: &S::Probe) -> bool {
        self.len.load(Acquire) != 0 && self.find(key, S::hash(key), &Guard::new()).is_some()
    }

    /// Returns `true` if any entry holds the value.
    ///
    /// This scans every bucket.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u64> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 10).is_none());
    /// assert!(map.contains_value(&10));
    /// assert!(!map.contains_value(&11));
    /// ```
    #[inline]
    pub fn contains_value(&self, value: &C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        if self.len.load(Acquire) == 0 {
            return false;
        }
        let guard = Guard::new();
        let Some(array) = self.array.load(Acquire, &guard).as_ref() else {
            return false;
        };
        let found = array.buckets().any(|bucket| {
            let mut current = bucket.load(Acquire, &guard).as_ref();
            while let Some(entry) = current {
                if self
                    .load_value(entry, &guard)
                    .is_some_and(|v| C::borrow(&v) == value)
                {
                    return true;
                }
                current = entry.next_entry();
            }
            false
        });
        found
    }

    /// Associates the value with the key, returning the previous value.
    ///
    /// A counter stored this way is kept even if it is zero; only [`HashTable::increment`] and
    /// [`HashTable::decrement`] remove a counter that reaches zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::LongHashMap;
    ///
    /// let map: LongHashMap<u32> = LongHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert_eq!(map.put(1, 1).map(|v| *v), Some(0));
    /// assert_eq!(map.get(&1).map(|v| *v), Some(1));
    /// ```
    #[inline]
    pub fn put(&self, key: S::Key, value: C::Value) -> Option<C::Output> {
        self.insert(key, value, true)
    }

    /// Inserts the entry unless the key exists, returning the current value if it does.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put_if_absent(1, 0).is_none());
    /// assert_eq!(map.put_if_absent(1, 1).map(|v| *v), Some(0));
    /// assert_eq!(map.get(&1).map(|v| *v), Some(0));
    /// ```
    #[inline]
    pub fn put_if_absent(&self, key: S::Key, value: C::Value) -> Option<C::Output> {
        self.insert(key, value, false)
    }

    /// Inserts a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] and leaves the existing entry as is if the key exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::{Error, IntHashMap};
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put_unique(1, 0).is_ok());
    /// assert_eq!(map.put_unique(1, 1), Err(Error::DuplicateKey));
    /// ```
    #[inline]
    pub fn put_unique(&self, key: S::Key, value: C::Value) -> Result<(), Error> {
        match self.insert(key, value, false) {
            Some(_) => Err(Error::DuplicateKey),
            None => Ok(()),
        }
    }

    /// Replaces the value of an existing entry, returning the previous value.
    ///
    /// Returns `None` without inserting anything if the key does not exist.
    ///
    /// A counter stored this way is kept even if it is zero; only [`HashTable::increment`] and
    /// [`HashTable::decrement`] remove a counter that reaches zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.replace(&1, 0).is_none());
    /// assert!(map.is_empty());
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert_eq!(map.replace(&1, 1).map(|v| *v), Some(0));
    /// ```
    #[inline]
    pub fn replace(&self, key: &S::Probe, value: C::Value) -> Option<C::Output> {
        let guard = Guard::new();
        let _writer = self.lock();
        let entry = self.find(key, S::hash(key), &guard)?;
        C::store(entry.cell(), value)
    }

    /// Replaces the value of an existing entry if it currently equals `expected`.
    ///
    /// A counter stored this way is kept even if it is zero; only [`HashTable::increment`] and
    /// [`HashTable::decrement`] remove a counter that reaches zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert!(!map.compare_and_replace(&1, &7, 2));
    /// assert!(map.compare_and_replace(&1, &0, 2));
    /// assert_eq!(map.get(&1).map(|v| *v), Some(2));
    /// ```
    #[inline]
    pub fn compare_and_replace(&self, key: &S::Probe, expected: &C::Value, value: C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        let guard = Guard::new();
        let _writer = self.lock();
        let Some(entry) = self.find(key, S::hash(key), &guard) else {
            return false;
        };
        let matched = C::load(entry.cell(), &guard).is_some_and(|v| C::borrow(&v) == expected);
        if matched {
            C::store(entry.cell(), value);
        }
        matched
    }

    /// Removes the entry, returning its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.remove(&1).is_none());
    /// assert!(map.put(1, 0).is_none());
    /// assert_eq!(map.remove(&1).map(|v| *v), Some(0));
    /// assert!(!map.contains_key(&1));
    /// ```
    #[inline]
    pub fn remove(&self, key: &S::Probe) -> Option<C::Output> {
        self.remove_if(key, |_| true)
    }

    /// Removes the entry if its value equals `expected`.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert!(map.remove_mapping(&1, &1).is_none());
    /// assert_eq!(map.remove_mapping(&1, &0).map(|v| *v), Some(0));
    /// ```
    #[inline]
    pub fn remove_mapping(&self, key: &S::Probe, expected: &C::Value) -> Option<C::Output>
    where
        C::Value: PartialEq,
    {
        self.remove_if(key, |v| C::borrow(v) == expected)
    }

    /// Removes the entry if the condition holds for its value.
    ///
    /// Every entry in front of the removed one in its bucket chain is replaced by a copy; the
    /// entries behind it are kept as they are.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert!(map.remove_if(&1, |v| **v == 1).is_none());
    /// assert_eq!(map.remove_if(&1, |v| **v == 0).map(|v| *v), Some(0));
    /// ```
    #[inline]
    pub fn remove_if<F: FnOnce(&C::Output) -> bool>(
        &self,
        key: &S::Probe,
        condition: F,
    ) -> Option<C::Output> {
        let guard = Guard::new();
        let _writer = self.lock();
        let array = self.array.load(Acquire, &guard).as_ref()?;
        let hash = S::hash(key);
        let bucket = array.bucket(hash);
        let first = bucket.get_shared(Acquire, &guard)?;
        let target = first.find(key, hash)?;
        let value = C::load(target.cell(), &guard)?;
        if !condition(&value) {
            return None;
        }
        self.unlink(bucket, &first, target, &guard);
        Some(value)
    }

    /// Removes every entry.
    ///
    /// The bucket array is kept at its current size.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert!(!map.contains_key(&1));
    /// ```
    #[inline]
    pub fn clear(&self) {
        let guard = Guard::new();
        let _writer = self.lock();
        if let Some(array) = self.array.load(Acquire, &guard).as_ref() {
            for bucket in array.buckets() {
                bucket.swap((None, Tag::None), Release);
            }
        }
        self.len.store(0, Release);
    }

    /// Doubles the number of buckets.
    ///
    /// Entries are moved to their new buckets without modifying the current bucket array, so
    /// concurrent readers of the current array are unaffected. It does nothing if the number of
    /// buckets has reached [`MAXIMUM_CAPACITY`](crate::MAXIMUM_CAPACITY). A map that has not
    /// allocated its bucket array yet allocates it first.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::with_capacity(4);
    ///
    /// map.rehash();
    /// assert_eq!(map.capacity(), 8);
    ///
    /// assert!(map.put(1, 0).is_none());
    /// map.rehash();
    /// assert_eq!(map.capacity(), 16);
    /// assert_eq!(map.get(&1).map(|v| *v), Some(0));
    /// ```
    #[inline]
    pub fn rehash(&self) {
        let guard = Guard::new();
        let mut threshold = self.lock();
        let array = self.allocate(&mut threshold, &guard);
        self.grow(array, &mut threshold, &guard);
    }

    /// Returns slot occupancy statistics of the current bucket array.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::with_capacity(4);
    ///
    /// for key in [1, 5, 2] {
    ///     assert!(map.put(key, 0).is_none());
    /// }
    /// let info = map.map_info();
    /// assert_eq!(info.slots, 4);
    /// assert_eq!(info.occupied_slots, 2);
    /// assert_eq!(info.collision_level(), 1.0 / 3.0);
    /// ```
    #[inline]
    pub fn map_info(&self) -> MapInfo {
        let guard = Guard::new();
        let len = self.len.load(Acquire);
        let Some(array) = self.array.load(Acquire, &guard).as_ref() else {
            return MapInfo {
                slots: self.initial_len,
                len,
                occupied_slots: 0,
                excess_entries: 0,
            };
        };
        let mut occupied_slots = 0;
        let mut excess_entries = 0;
        for bucket in array.buckets() {
            let mut chain_len = 0;
            let mut current = bucket.load(Acquire, &guard).as_ref();
            while let Some(entry) = current {
                chain_len += 1;
                current = entry.next_entry();
            }
            if chain_len != 0 {
                occupied_slots += 1;
                excess_entries += chain_len - 1;
            }
        }
        MapInfo {
            slots: array.len(),
            len,
            occupied_slots,
            excess_entries,
        }
    }

    /// Returns a reusable iterator over the keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// let mut keys = map.key_iter();
    /// assert_eq!(keys.next(), Some(1));
    /// assert_eq!(keys.next(), None);
    ///
    /// keys.rewind();
    /// assert_eq!(keys.next(), Some(1));
    /// ```
    #[inline]
    pub fn key_iter(&self) -> KeyIter<'_, S, C> {
        ReusableIter::new(self)
    }

    /// Returns a reusable iterator over the values.
    #[inline]
    pub fn value_iter(&self) -> ValueIter<'_, S, C> {
        ReusableIter::new(self)
    }

    /// Returns a reusable iterator over the entries.
    #[inline]
    pub fn entry_iter(&self) -> EntryIter<'_, S, C> {
        ReusableIter::new(self)
    }

    /// Returns a live view of the keys.
    ///
    /// Views hold nothing but a reference to the [`HashTable`], so a new one is handed out on
    /// every call instead of a cached instance; all of them observe the same entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntHashMap;
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    /// let keys = map.key_set();
    ///
    /// assert!(map.put(1, 0).is_none());
    /// assert!(keys.contains(&1));
    /// assert_eq!(keys.len(), 1);
    /// ```
    #[inline]
    pub fn key_set(&self) -> KeySet<'_, S, C> {
        KeySet::new(self)
    }

    /// Returns a live view of the values.
    #[inline]
    pub fn values(&self) -> Values<'_, S, C> {
        Values::new(self)
    }

    /// Returns a live view of the entries.
    #[inline]
    pub fn entry_set(&self) -> EntrySet<'_, S, C> {
        EntrySet::new(self)
    }

    /// Returns the current bucket array.
    #[inline]
    pub(crate) fn bucket_array(&self, guard: &Guard) -> Option<Shared<BucketArray<S, C>>> {
        self.array.get_shared(Acquire, guard)
    }

    /// Reads the value of an entry, falling back to reading it under the writer lock.
    #[inline]
    pub(crate) fn load_value(&self, entry: &Entry<S, C>, guard: &Guard) -> Option<C::Output> {
        C::load(entry.cell(), guard).or_else(|| {
            let _writer = self.lock();
            C::load(entry.cell(), guard)
        })
    }

    /// Inserts an entry produced by `constructor` under the writer lock, returning its key.
    ///
    /// An existing entry with the same key gets the new value.
    pub(crate) fn put_with<F: FnOnce() -> (S::Key, C::Value)>(&self, constructor: F) -> S::Key {
        let guard = Guard::new();
        let mut threshold = self.lock();
        let (key, value) = constructor();
        let hash = S::hash(S::probe(&key));
        if let Some(entry) = self.find(S::probe(&key), hash, &guard) {
            C::store(entry.cell(), value);
        } else {
            self.link(&mut threshold, key.clone(), hash, C::new_cell(value), &guard);
        }
        key
    }

    #[cfg(not(feature = "loom"))]
    const fn from_parts(initial_len: usize, load_factor: f32) -> Self {
        Self {
            array: AtomicShared::null(),
            len: AtomicUsize::new(0),
            initial_len,
            load_factor,
            threshold: Mutex::new(0),
        }
    }

    #[cfg(feature = "loom")]
    fn from_parts(initial_len: usize, load_factor: f32) -> Self {
        Self {
            array: AtomicShared::null(),
            len: AtomicUsize::new(0),
            initial_len,
            load_factor,
            threshold: Mutex::new(0),
        }
    }

    /// Acquires the writer lock.
    ///
    /// A writer never leaves a bucket chain half-updated, so a poisoned lock is taken over.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.threshold.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Searches the current bucket array for the key.
    #[inline]
    fn find<'g>(&self, key: &S::Probe, hash: u32, guard: &'g Guard) -> Option<&'g Entry<S, C>> {
        let array = self.array.load(Acquire, guard).as_ref()?;
        array.head(hash, guard).as_ref()?.find(key, hash)
    }

    fn insert(&self, key: S::Key, value: C::Value, overwrite: bool) -> Option<C::Output> {
        let guard = Guard::new();
        let mut threshold = self.lock();
        let hash = S::hash(S::probe(&key));
        if let Some(entry) = self.find(S::probe(&key), hash, &guard) {
            return if overwrite {
                C::store(entry.cell(), value)
            } else {
                C::load(entry.cell(), &guard)
            };
        }
        self.link(&mut threshold, key, hash, C::new_cell(value), &guard);
        None
    }

    /// Links a new entry to the head of its bucket chain, and then publishes the new length.
    ///
    /// The writer lock must be held, and the key must not exist.
    fn link(&self, threshold: &mut usize, key: S::Key, hash: u32, cell: C::Cell, guard: &Guard) {
        let len = self.len.load(Relaxed);
        let mut array = self.allocate(threshold, guard);
        if len + 1 > *threshold {
            array = self.grow(array, threshold, guard);
        }
        let bucket = array.bucket(hash);
        let head = bucket.get_shared(Relaxed, guard);
        let entry = Shared::new(Entry::new(key, hash, cell, head));
        bucket.swap((Some(entry), Tag::None), Release);
        self.len.store(len + 1, Release);
    }

    /// Unlinks `target` from the chain headed by `first`, and then publishes the new length.
    ///
    /// The writer lock must be held.
    fn unlink(
        &self,
        bucket: &AtomicShared<Entry<S, C>>,
        first: &Shared<Entry<S, C>>,
        target: &Entry<S, C>,
        guard: &Guard,
    ) {
        bucket.swap((Entry::unlink(first, target, guard), Tag::None), Release);
        self.len.store(self.len.load(Relaxed) - 1, Release);
    }

    /// Returns the current bucket array, allocating it if there is none.
    fn allocate<'g>(&self, threshold: &mut usize, guard: &'g Guard) -> &'g BucketArray<S, C> {
        if let Some(array) = self.array.load(Acquire, guard).as_ref() {
            return array;
        }
        log::trace!("allocating {} buckets", self.initial_len);
        let array = Shared::new(BucketArray::new(self.initial_len));
        let array_ref = array.get_guarded_ref(guard);
        *threshold = threshold_for(self.initial_len, self.load_factor);
        self.array.swap((Some(array), Tag::None), Release);
        array_ref
    }

    /// Replaces `array` with one twice as large, returning the new array.
    fn grow<'g>(
        &self,
        array: &'g BucketArray<S, C>,
        threshold: &mut usize,
        guard: &'g Guard,
    ) -> &'g BucketArray<S, C> {
        let old_len = array.len();
        if old_len >= MAXIMUM_CAPACITY {
            if *threshold != usize::MAX {
                log::warn!("bucket array has reached the maximum capacity of {old_len}");
                *threshold = usize::MAX;
            }
            return array;
        }
        let new_array = Shared::new(array.grow(guard));
        let new_array_ref = new_array.get_guarded_ref(guard);
        *threshold = threshold_for(new_array_ref.len(), self.load_factor);
        log::debug!(
            "rehashed {} entries from {old_len} to {} buckets",
            self.len.load(Relaxed),
            new_array_ref.len()
        );
        self.array.swap((Some(new_array), Tag::None), Release);
        new_array_ref
    }
}

impl<S: KeyStrategy, C: Counter> HashTable<S, C> {
    /// Adds the amount to the counter of the key, returning the new count.
    ///
    /// The counter is created if the key does not exist, and removed if the count reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonPositiveAmount`] if the amount is not greater than zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::{Error, LongIntCounterMap};
    ///
    /// let map = LongIntCounterMap::new();
    ///
    /// assert_eq!(map.increment(1, 3), Ok(3));
    /// assert_eq!(map.increment(1, 2), Ok(5));
    /// assert_eq!(map.increment(1, 0), Err(Error::NonPositiveAmount));
    /// ```
    #[inline]
    pub fn increment(&self, key: S::Key, amount: C::Value) -> Result<C::Output, Error> {
        if !C::is_positive(&amount) {
            return Err(Error::NonPositiveAmount);
        }
        Ok(self.add_to_counter(key, amount))
    }

    /// Subtracts the amount from the counter of the key, returning the new count.
    ///
    /// A key that does not exist gets a negative counter, and a counter reaching zero is removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonPositiveAmount`] if the amount is not greater than zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::IntLongCounterMap;
    ///
    /// let map = IntLongCounterMap::new();
    ///
    /// assert_eq!(map.decrement(1, 2), Ok(-2));
    /// assert_eq!(map.increment(1, 2), Ok(0));
    /// assert!(!map.contains_key(&1));
    /// ```
    #[inline]
    pub fn decrement(&self, key: S::Key, amount: C::Value) -> Result<C::Output, Error> {
        if !C::is_positive(&amount) {
            return Err(Error::NonPositiveAmount);
        }
        Ok(self.add_to_counter(key, C::negate(amount)))
    }

    /// Adds one to the counter of the key, returning the new count.
    #[inline]
    pub fn increment_one(&self, key: S::Key) -> C::Output {
        self.add_to_counter(key, C::ONE)
    }

    /// Subtracts one from the counter of the key, returning the new count.
    #[inline]
    pub fn decrement_one(&self, key: S::Key) -> C::Output {
        self.add_to_counter(key, C::negate(C::ONE))
    }

    fn add_to_counter(&self, key: S::Key, delta: C::Value) -> C::Output {
        let guard = Guard::new();
        let mut threshold = self.lock();
        let hash = S::hash(S::probe(&key));
        if let Some(array) = self.array.load(Acquire, &guard).as_ref() {
            let bucket = array.bucket(hash);
            if let Some(first) = bucket.get_shared(Acquire, &guard) {
                if let Some(target) = first.find(S::probe(&key), hash) {
                    let count = C::add(target.cell(), delta);
                    if C::is_zero(&count) {
                        self.unlink(bucket, &first, target, &guard);
                    }
                    return count;
                }
            }
        }
        let cell = C::new_cell(delta);
        let count = C::get(&cell);
        self.link(&mut threshold, key, hash, cell, &guard);
        count
    }
}

impl<S, C> Debug for HashTable<S, C>
where
    S: KeyStrategy,
    S::Key: Debug,
    C: ValueKind,
    C::Value: Debug,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_map();
        for (key, value) in self.entry_iter() {
            d.entry(&key, C::borrow(&value));
        }
        d.finish()
    }
}

impl<S: KeyStrategy, C: ValueKind> Default for HashTable<S, C> {
    /// Creates an empty default [`HashTable`].
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::ByteArrayHashMap;
    ///
    /// let map: ByteArrayHashMap<u32> = ByteArrayHashMap::default();
    /// assert_eq!(map.capacity(), 16);
    /// ```
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<S: KeyStrategy, C: ValueKind> Extend<(S::Key, C::Value)> for HashTable<S, C> {
    #[inline]
    fn extend<T: IntoIterator<Item = (S::Key, C::Value)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<S, C> PartialEq for HashTable<S, C>
where
    S: KeyStrategy,
    C: ValueKind,
    C::Value: PartialEq,
{
    /// Compares two [`HashTable`] instances.
    ///
    /// The result is unspecified if either of them is modified during the comparison.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entry_iter().all(|(key, value)| {
                other
                    .get(S::probe(&key))
                    .is_some_and(|v| C::borrow(&v) == C::borrow(&value))
            })
    }
}

impl<S: KeyStrategy, C: ValueKind> FromIterator<(S::Key, C::Value)> for HashTable<S, C> {
    #[inline]
    fn from_iter<T: IntoIterator<Item = (S::Key, C::Value)>>(iter: T) -> Self {
        let into_iter = iter.into_iter();
        let table = Self::with_capacity(into_iter.size_hint().0.max(DEFAULT_CAPACITY));
        into_iter.for_each(|(key, value)| {
            table.put(key, value);
        });
        table
    }
}
