//! Live set and collection views of a [`HashTable`].
//!
//! A view holds nothing but a reference to its table; every operation is forwarded to the table,
//! and changes made through either side are immediately visible on the other.

use std::fmt::{self, Debug};

use crate::iter::{EntryIter, KeyIter, ValueIter};
use crate::key::KeyStrategy;
use crate::value::ValueKind;
use crate::HashTable;

/// View of the keys of a [`HashTable`].
///
/// # Examples
///
/// ```
/// use primitive_maps::ByteArrayHashMap;
/// use std::sync::Arc;
///
/// let map: ByteArrayHashMap<u32> = ByteArrayHashMap::new();
/// let keys = map.key_set();
///
/// assert!(map.put(Arc::from(&b"key"[..]), 0).is_none());
/// assert!(keys.contains(b"key"));
/// assert!(keys.remove(b"key"));
/// assert!(map.is_empty());
/// ```
pub struct KeySet<'t, S: KeyStrategy, C: ValueKind> {
    table: &'t HashTable<S, C>,
}

/// View of the values of a [`HashTable`].
pub struct Values<'t, S: KeyStrategy, C: ValueKind> {
    table: &'t HashTable<S, C>,
}

/// View of the key-value pairs of a [`HashTable`].
pub struct EntrySet<'t, S: KeyStrategy, C: ValueKind> {
    table: &'t HashTable<S, C>,
}

impl<'t, S: KeyStrategy, C: ValueKind> KeySet<'t, S, C> {
    /// Returns the number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if there is no key.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` if the key exists.
    #[inline]
    pub fn contains(&self, key: &S::Probe) -> bool {
        self.table.contains_key(key)
    }

    /// Removes the key and its value, returning `true` if the key existed.
    #[inline]
    pub fn remove(&self, key: &S::Probe) -> bool {
        self.table.remove(key).is_some()
    }

    /// Removes every entry.
    #[inline]
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Returns an iterator over the keys.
    #[inline]
    pub fn iter(&self) -> KeyIter<'t, S, C> {
        self.table.key_iter()
    }

    pub(crate) const fn new(table: &'t HashTable<S, C>) -> Self {
        Self { table }
    }
}

impl<'t, S: KeyStrategy, C: ValueKind> Values<'t, S, C> {
    /// Returns the number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if there is no value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` if any entry holds the value.
    #[inline]
    pub fn contains(&self, value: &C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        self.table.contains_value(value)
    }

    /// Removes one entry holding the value, returning `true` if an entry was removed.
    ///
    /// The entries are scanned in iteration order; an entry whose value is replaced concurrently
    /// is skipped.
    #[inline]
    pub fn remove(&self, value: &C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        self.table
            .entry_iter()
            .filter(|(_, v)| C::borrow(v) == value)
            .any(|(key, _)| self.table.remove_mapping(S::probe(&key), value).is_some())
    }

    /// Removes every entry.
    #[inline]
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Returns an iterator over the values.
    #[inline]
    pub fn iter(&self) -> ValueIter<'t, S, C> {
        self.table.value_iter()
    }

    pub(crate) const fn new(table: &'t HashTable<S, C>) -> Self {
        Self { table }
    }
}

impl<'t, S: KeyStrategy, C: ValueKind> EntrySet<'t, S, C> {
    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if there is no entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` if the key is associated with the value.
    ///
    /// # Examples
    ///
    /// ```
    /// use primitive_maps::LongLongCounterMap;
    ///
    /// let map = LongLongCounterMap::new();
    /// let entries = map.entry_set();
    ///
    /// assert_eq!(map.increment(7, 3), Ok(3));
    /// assert!(entries.contains(&7, &3));
    /// assert!(!entries.contains(&7, &2));
    /// assert!(!entries.remove(&7, &2));
    /// assert!(entries.remove(&7, &3));
    /// assert!(entries.is_empty());
    /// ```
    #[inline]
    pub fn contains(&self, key: &S::Probe, value: &C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        self.table
            .get(key)
            .is_some_and(|current| C::borrow(&current) == value)
    }

    /// Removes the entry if the key is associated with the value.
    #[inline]
    pub fn remove(&self, key: &S::Probe, value: &C::Value) -> bool
    where
        C::Value: PartialEq,
    {
        self.table.remove_mapping(key, value).is_some()
    }

    /// Removes every entry.
    #[inline]
    pub fn clear(&self) {
        self.table.clear();
    }

    /// Returns an iterator over the entries.
    #[inline]
    pub fn iter(&self) -> EntryIter<'t, S, C> {
        self.table.entry_iter()
    }

    pub(crate) const fn new(table: &'t HashTable<S, C>) -> Self {
        Self { table }
    }
}

macro_rules! view_common {
    ($view:ident, $iter:ident, $item:ty) => {
        impl<S: KeyStrategy, C: ValueKind> Clone for $view<'_, S, C> {
            #[inline]
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<S: KeyStrategy, C: ValueKind> Copy for $view<'_, S, C> {}

        impl<S: KeyStrategy, C: ValueKind> Debug for $view<'_, S, C> {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($view))
                    .field("len", &self.len())
                    .finish()
            }
        }

        impl<'t, S: KeyStrategy, C: ValueKind> IntoIterator for $view<'t, S, C> {
            type Item = $item;
            type IntoIter = $iter<'t, S, C>;

            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

view_common!(KeySet, KeyIter, S::Key);
view_common!(Values, ValueIter, C::Output);
view_common!(EntrySet, EntryIter, (S::Key, C::Output));
