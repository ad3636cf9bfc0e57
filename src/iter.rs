//! Rewindable iterators over a [`HashTable`].

use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::sync::atomic::Ordering::Acquire;

use sdd::{Guard, Shared};

use crate::hash_table::bucket_array::BucketArray;
use crate::hash_table::entry::Entry;
use crate::key::KeyStrategy;
use crate::value::ValueKind;
use crate::{Error, HashTable};

/// Iterator over the keys of a [`HashTable`].
pub type KeyIter<'t, S, C> = ReusableIter<'t, S, C, KeyProjection>;

/// Iterator over the values of a [`HashTable`].
pub type ValueIter<'t, S, C> = ReusableIter<'t, S, C, ValueProjection>;

/// Iterator over the key-value pairs of a [`HashTable`].
pub type EntryIter<'t, S, C> = ReusableIter<'t, S, C, EntryProjection>;

/// Selects what a [`ReusableIter`] yields for each entry.
pub trait Projection<S: KeyStrategy, C: ValueKind> {
    /// The item type.
    type Item;

    /// Projects an entry onto an item; `value` reads the value of the entry.
    ///
    /// Returns `None` if the entry is to be skipped.
    fn project<F: FnOnce() -> Option<C::Output>>(key: &S::Key, value: F) -> Option<Self::Item>;
}

/// Yields keys.
#[derive(Clone, Copy, Debug)]
pub struct KeyProjection;

/// Yields values.
#[derive(Clone, Copy, Debug)]
pub struct ValueProjection;

/// Yields key-value pairs.
#[derive(Clone, Copy, Debug)]
pub struct EntryProjection;

impl<S: KeyStrategy, C: ValueKind> Projection<S, C> for KeyProjection {
    type Item = S::Key;

    #[inline]
    fn project<F: FnOnce() -> Option<C::Output>>(key: &S::Key, _value: F) -> Option<S::Key> {
        Some(key.clone())
    }
}

impl<S: KeyStrategy, C: ValueKind> Projection<S, C> for ValueProjection {
    type Item = C::Output;

    #[inline]
    fn project<F: FnOnce() -> Option<C::Output>>(_key: &S::Key, value: F) -> Option<C::Output> {
        value()
    }
}

impl<S: KeyStrategy, C: ValueKind> Projection<S, C> for EntryProjection {
    type Item = (S::Key, C::Output);

    #[inline]
    fn project<F: FnOnce() -> Option<C::Output>>(
        key: &S::Key,
        value: F,
    ) -> Option<(S::Key, C::Output)> {
        value().map(|v| (key.clone(), v))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    /// Positioned before the first entry.
    Fresh,
    /// At least one entry has been returned.
    Advancing,
    /// No entry is left, or the iterator was cleaned up.
    Exhausted,
}

/// [`ReusableIter`] is a cursor over a snapshot of the bucket array of a [`HashTable`] that can
/// be rewound and driven through any number of scans.
///
/// Buckets are visited from the highest index down to zero, and each bucket chain from its head
/// to its tail. The iterator is weakly consistent: every entry that is present from the time the
/// snapshot is taken until the scan is over is returned exactly once, while entries inserted or
/// removed concurrently may or may not be returned. Concurrent modification never causes an
/// error.
///
/// # Examples
///
/// ```
/// use primitive_maps::IntHashMap;
///
/// let map: IntHashMap<u32> = IntHashMap::new();
/// for key in 0..4 {
///     assert!(map.put(key, 0).is_none());
/// }
///
/// let mut iter = map.key_iter();
/// let first: Vec<i32> = iter.by_ref().collect();
/// iter.rewind();
/// let second: Vec<i32> = iter.by_ref().collect();
/// assert_eq!(first, vec![3, 2, 1, 0]);
/// assert_eq!(first, second);
/// ```
pub struct ReusableIter<'t, S: KeyStrategy, C: ValueKind, P: Projection<S, C>> {
    table: &'t HashTable<S, C>,
    array: Option<Shared<BucketArray<S, C>>>,
    next_index: usize,
    next_entry: Option<Shared<Entry<S, C>>>,
    last_returned: Option<S::Key>,
    phase: Phase,
    _projection: PhantomData<P>,
}

impl<'t, S: KeyStrategy, C: ValueKind, P: Projection<S, C>> ReusableIter<'t, S, C, P> {
    /// Returns `true` if another item can be returned.
    #[inline]
    pub fn has_next(&mut self) -> bool {
        self.fill();
        self.next_entry.is_some()
    }

    /// Returns the next item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] if there is no item left.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::{Error, IntHashMap};
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    /// assert!(map.put(1, 0).is_none());
    ///
    /// let mut iter = map.entry_iter();
    /// assert_eq!(iter.try_next().map(|(k, v)| (k, *v)), Ok((1, 0)));
    /// assert_eq!(iter.try_next().err(), Some(Error::Exhausted));
    /// ```
    #[inline]
    pub fn try_next(&mut self) -> Result<P::Item, Error> {
        let guard = Guard::new();
        loop {
            self.fill();
            let Some(entry) = self.next_entry.take() else {
                self.phase = Phase::Exhausted;
                self.last_returned = None;
                return Err(Error::Exhausted);
            };
            self.next_entry = entry.next().cloned();
            let table = self.table;
            if let Some(item) = P::project(entry.key(), || table.load_value(&entry, &guard)) {
                self.phase = Phase::Advancing;
                self.last_returned = Some(entry.key().clone());
                return Ok(item);
            }
        }
    }

    /// Removes the entry that was last returned from the [`HashTable`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCurrentEntry`] if no entry was returned since the last call to
    /// [`remove`](Self::remove) or [`rewind`](Self::rewind).
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::{Error, IntHashMap};
    ///
    /// let map: IntHashMap<u32> = IntHashMap::new();
    /// assert!(map.put(1, 0).is_none());
    ///
    /// let mut iter = map.key_iter();
    /// assert_eq!(iter.remove(), Err(Error::NoCurrentEntry));
    /// assert_eq!(iter.next(), Some(1));
    /// assert!(iter.remove().is_ok());
    /// assert_eq!(iter.remove(), Err(Error::NoCurrentEntry));
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn remove(&mut self) -> Result<(), Error> {
        let key = self.last_returned.take().ok_or(Error::NoCurrentEntry)?;
        self.table.remove(S::probe(&key));
        Ok(())
    }

    /// Takes a new snapshot of the [`HashTable`] and moves the cursor before the first entry.
    #[inline]
    pub fn rewind(&mut self) {
        let guard = Guard::new();
        self.array = self.table.bucket_array(&guard);
        self.next_index = self.array.as_ref().map_or(0, |a| a.len());
        self.next_entry = None;
        self.last_returned = None;
        self.phase = Phase::Fresh;
    }

    /// Drops the snapshot so that the memory it retains can be reclaimed.
    ///
    /// The iterator yields nothing until it is rewound.
    #[inline]
    pub fn clean_up(&mut self) {
        self.array = None;
        self.next_index = 0;
        self.next_entry = None;
        self.last_returned = None;
        self.phase = Phase::Exhausted;
    }

    pub(crate) fn new(table: &'t HashTable<S, C>) -> Self {
        let mut iter = Self {
            table,
            array: None,
            next_index: 0,
            next_entry: None,
            last_returned: None,
            phase: Phase::Fresh,
            _projection: PhantomData,
        };
        iter.rewind();
        iter
    }

    /// Positions `next_entry` on the next entry unless it is already there.
    fn fill(&mut self) {
        if self.next_entry.is_some() || self.phase == Phase::Exhausted {
            return;
        }
        let Some(array) = self.array.as_ref() else {
            return;
        };
        let guard = Guard::new();
        while self.next_index > 0 {
            self.next_index -= 1;
            if let Some(first) = array.bucket_at(self.next_index).get_shared(Acquire, &guard) {
                self.next_entry = Some(first);
                return;
            }
        }
    }
}

impl<S, C, P> Debug for ReusableIter<'_, S, C, P>
where
    S: KeyStrategy,
    C: ValueKind,
    P: Projection<S, C>,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReusableIter")
            .field("next_index", &self.next_index)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<S: KeyStrategy, C: ValueKind, P: Projection<S, C>> Iterator for ReusableIter<'_, S, C, P> {
    type Item = P::Item;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }
}
