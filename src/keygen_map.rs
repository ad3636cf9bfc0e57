//! [`KeygenMap`] assigns sequential `i32` keys to the values inserted into it.

use std::fmt::{self, Debug};
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering::Relaxed;

use sdd::Shared;

use crate::config::KeygenConfig;
use crate::iter::{EntryIter, KeyIter, ValueIter};
use crate::key::IntKey;
use crate::map_info::MapInfo;
use crate::value::ObjectValue;
use crate::view::{EntrySet, KeySet, Values};
use crate::{Error, IntHashMap};

/// Values that record the key they are stored under.
pub trait KeySetter {
    /// Stores the key assigned to the value.
    fn set_key(&mut self, key: i32);
}

/// [`KeygenMap`] is an `i32`-keyed map that generates the key of each value.
///
/// Keys are handed out sequentially from `start_key`, and wrap back to `start_key` once
/// `max_key` is reached. A generated key that is still in use gets the new value.
///
/// # Examples
///
/// ```
/// use primitive_maps::{KeySetter, KeygenMap};
///
/// struct Session {
///     id: i32,
/// }
///
/// impl KeySetter for Session {
///     fn set_key(&mut self, key: i32) {
///         self.id = key;
///     }
/// }
///
/// let sessions: KeygenMap<Session> = KeygenMap::with_range(0, 3).unwrap();
/// let keys: Vec<i32> = (0..4).map(|_| sessions.add(Session { id: -1 })).collect();
/// assert_eq!(keys, vec![0, 1, 2, 0]);
/// assert_eq!(sessions.get(1).map(|s| s.id), Some(1));
/// assert_eq!(sessions.len(), 3);
/// ```
pub struct KeygenMap<V: KeySetter + Send + Sync + 'static> {
    table: IntHashMap<V>,

    /// The next key to assign; only modified under the writer lock of `table`.
    next_key: AtomicI32,
    start_key: i32,
    max_key: i32,
}

impl<V: KeySetter + Send + Sync + 'static> KeygenMap<V> {
    /// Creates an empty [`KeygenMap`] generating keys in `[0, i32::MAX)`.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: IntHashMap::new(),
            next_key: AtomicI32::new(0),
            start_key: 0,
            max_key: i32::MAX,
        }
    }

    /// Creates an empty [`KeygenMap`] generating keys in `[start_key, max_key)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalKeyRange`] if either bound is negative or the range is empty.
    #[inline]
    pub fn with_range(start_key: i32, max_key: i32) -> Result<Self, Error> {
        Self::with_config(KeygenConfig {
            start_key,
            max_key,
            ..KeygenConfig::default()
        })
    }

    /// Creates an empty [`KeygenMap`] from a [`KeygenConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the [`KeygenConfig`] is invalid.
    #[inline]
    pub fn with_config(config: KeygenConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            table: IntHashMap::with_config(config.table)?,
            next_key: AtomicI32::new(config.start_key),
            start_key: config.start_key,
            max_key: config.max_key,
        })
    }

    /// Assigns the next key to the value and inserts it, returning the key.
    #[inline]
    pub fn add(&self, mut value: V) -> i32 {
        self.table.put_with(|| {
            let key = self.next_key.load(Relaxed);
            let following = if key + 1 >= self.max_key {
                self.start_key
            } else {
                key + 1
            };
            self.next_key.store(following, Relaxed);
            value.set_key(key);
            (key, value)
        })
    }

    /// Returns the value associated with the key.
    #[inline]
    pub fn get(&self, key: i32) -> Option<Shared<V>> {
        self.table.get(&key)
    }

    /// Returns `true` if the key exists.
    #[inline]
    pub fn contains_key(&self, key: i32) -> bool {
        self.table.contains_key(&key)
    }

    /// Returns `true` if any entry holds the value.
    #[inline]
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.table.contains_value(value)
    }

    /// Replaces the value of an existing entry, returning the previous value.
    #[inline]
    pub fn replace(&self, key: i32, value: V) -> Option<Shared<V>> {
        self.table.replace(&key, value)
    }

    /// Replaces the value of an existing entry if it currently equals `expected`.
    #[inline]
    pub fn compare_and_replace(&self, key: i32, expected: &V, value: V) -> bool
    where
        V: PartialEq,
    {
        self.table.compare_and_replace(&key, expected, value)
    }

    /// Removes the entry, returning its value.
    #[inline]
    pub fn remove(&self, key: i32) -> Option<Shared<V>> {
        self.table.remove(&key)
    }

    /// Removes the entry if its value equals `expected`.
    #[inline]
    pub fn remove_mapping(&self, key: i32, expected: &V) -> Option<Shared<V>>
    where
        V: PartialEq,
    {
        self.table.remove_mapping(&key, expected)
    }

    /// Removes every entry.
    ///
    /// Key generation carries on from where it was.
    #[inline]
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns slot occupancy statistics.
    #[inline]
    pub fn map_info(&self) -> MapInfo {
        self.table.map_info()
    }

    /// Returns a reusable iterator over the keys.
    #[inline]
    pub fn key_iter(&self) -> KeyIter<'_, IntKey, ObjectValue<V>> {
        self.table.key_iter()
    }

    /// Returns a reusable iterator over the values.
    #[inline]
    pub fn value_iter(&self) -> ValueIter<'_, IntKey, ObjectValue<V>> {
        self.table.value_iter()
    }

    /// Returns a reusable iterator over the entries.
    #[inline]
    pub fn entry_iter(&self) -> EntryIter<'_, IntKey, ObjectValue<V>> {
        self.table.entry_iter()
    }

    /// Returns a live view of the keys.
    #[inline]
    pub fn key_set(&self) -> KeySet<'_, IntKey, ObjectValue<V>> {
        self.table.key_set()
    }

    /// Returns a live view of the values.
    #[inline]
    pub fn values(&self) -> Values<'_, IntKey, ObjectValue<V>> {
        self.table.values()
    }

    /// Returns a live view of the entries.
    #[inline]
    pub fn entry_set(&self) -> EntrySet<'_, IntKey, ObjectValue<V>> {
        self.table.entry_set()
    }
}

impl<V: KeySetter + Debug + Send + Sync + 'static> Debug for KeygenMap<V> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeygenMap")
            .field("start_key", &self.start_key)
            .field("max_key", &self.max_key)
            .field("next_key", &self.next_key.load(Relaxed))
            .field("entries", &self.table)
            .finish()
    }
}

impl<V: KeySetter + Send + Sync + 'static> Default for KeygenMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::{KeySetter, KeygenMap};
    use crate::Error;

    #[derive(Debug, PartialEq)]
    struct Item {
        key: i32,
        name: &'static str,
    }

    impl KeySetter for Item {
        fn set_key(&mut self, key: i32) {
            self.key = key;
        }
    }

    fn item(name: &'static str) -> Item {
        Item { key: -1, name }
    }

    #[test]
    fn sequential_keys() {
        let map: KeygenMap<Item> = KeygenMap::with_range(10, 1000).unwrap();
        for expected in 10..110 {
            assert_eq!(map.add(item("x")), expected);
        }
        assert_eq!(map.len(), 100);
        assert!(map.key_iter().all(|k| map.get(k).is_some_and(|v| v.key == k)));
    }

    #[test]
    fn wraparound_supersedes() {
        let map: KeygenMap<Item> = KeygenMap::with_range(0, 3).unwrap();
        let keys: Vec<i32> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|name| map.add(item(name)))
            .collect();
        assert_eq!(keys, vec![0, 1, 2, 0]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(0).map(|v| v.name), Some("d"));

        map.clear();
        assert_eq!(map.add(item("e")), 1);
    }

    #[test]
    fn single_key_range() {
        let map: KeygenMap<Item> = KeygenMap::with_range(5, 6).unwrap();
        assert_eq!(map.add(item("a")), 5);
        assert_eq!(map.add(item("b")), 5);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn illegal_range() {
        assert_eq!(
            KeygenMap::<Item>::with_range(3, 3).err(),
            Some(Error::IllegalKeyRange {
                start_key: 3,
                max_key: 3
            })
        );
        assert!(KeygenMap::<Item>::with_range(-1, 3).is_err());
    }

    #[test]
    fn forwarded_operations() {
        let map: KeygenMap<Item> = KeygenMap::new();
        let key = map.add(item("a"));
        assert!(map.contains_key(key));
        assert!(map.contains_value(&Item { key, name: "a" }));
        assert!(map.compare_and_replace(key, &Item { key, name: "a" }, item("b")));
        assert_eq!(map.replace(key, item("c")).map(|v| v.name), Some("b"));
        assert!(map
            .remove_mapping(key, &Item { key, name: "b" })
            .is_none());
        assert_eq!(map.remove(key).map(|v| v.name), Some("c"));
        assert!(map.is_empty());
    }
}
