use std::ptr;
use std::sync::atomic::Ordering::Acquire;

use sdd::{AtomicShared, Guard, Ptr, Shared};

use super::entry::Entry;
use crate::key::KeyStrategy;
use crate::value::ValueKind;

/// [`BucketArray`] is a power-of-two sized array of bucket chain heads.
///
/// A [`BucketArray`] is never modified once it has been superseded by a larger one; readers that
/// loaded it before the rehash may keep traversing it until they drop their [`Guard`].
pub struct BucketArray<S: KeyStrategy, C: ValueKind> {
    buckets: Box<[AtomicShared<Entry<S, C>>]>,
}

impl<S: KeyStrategy, C: ValueKind> BucketArray<S, C> {
    /// Creates an empty [`BucketArray`] of the given length.
    ///
    /// `len` must be a power of two.
    pub(crate) fn new(len: usize) -> Self {
        debug_assert!(len.is_power_of_two());
        Self {
            buckets: (0..len).map(|_| AtomicShared::null()).collect(),
        }
    }

    /// Returns the number of buckets.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Calculates the bucket index for the hash value.
    #[inline]
    pub(crate) fn index(&self, hash: u32) -> usize {
        hash as usize & (self.len() - 1)
    }

    /// Returns the bucket for the hash value.
    #[inline]
    pub(crate) fn bucket(&self, hash: u32) -> &AtomicShared<Entry<S, C>> {
        &self.buckets[self.index(hash)]
    }

    /// Returns the bucket at the given position.
    #[inline]
    pub(crate) fn bucket_at(&self, index: usize) -> &AtomicShared<Entry<S, C>> {
        &self.buckets[index]
    }

    /// Returns an iterator over the buckets.
    #[inline]
    pub(crate) fn buckets(&self) -> impl Iterator<Item = &AtomicShared<Entry<S, C>>> {
        self.buckets.iter()
    }

    /// Returns the first entry of the bucket for the hash value.
    #[inline]
    pub(crate) fn head<'g>(&self, hash: u32, guard: &'g Guard) -> Ptr<'g, Entry<S, C>> {
        self.bucket(hash).load(Acquire, guard)
    }

    /// Creates a new [`BucketArray`] twice as large, holding the same entries.
    ///
    /// For each chain, the longest suffix whose entries all land in the same new bucket is linked
    /// into the new array as is; the entries in front of it are cloned in the original order.
    /// `self` is left unmodified.
    pub(crate) fn grow(&self, guard: &Guard) -> Self {
        let new_len = self.len() << 1;
        let mask = new_len - 1;
        let mut heads: Vec<Option<Shared<Entry<S, C>>>> = (0..new_len).map(|_| None).collect();
        for bucket in self.buckets() {
            let Some(first) = bucket.get_shared(Acquire, guard) else {
                continue;
            };

            let mut last_run: &Shared<Entry<S, C>> = &first;
            let mut last_index = first.hash() as usize & mask;
            let mut current = first.next();
            while let Some(entry) = current {
                let index = entry.hash() as usize & mask;
                if index != last_index {
                    last_index = index;
                    last_run = entry;
                }
                current = entry.next();
            }

            // Buckets of the old array map onto disjoint pairs of new buckets.
            debug_assert!(heads[last_index].is_none());
            heads[last_index] = Some(last_run.clone());

            let mut prefix: Vec<&Entry<S, C>> = Vec::new();
            let mut current: Option<&Entry<S, C>> = Some(&*first);
            while let Some(entry) = current {
                if ptr::eq(entry, &**last_run) {
                    break;
                }
                prefix.push(entry);
                current = entry.next().map(|n| &**n);
            }
            for entry in prefix.into_iter().rev() {
                let index = entry.hash() as usize & mask;
                let next = heads[index].take();
                heads[index] = Some(Shared::new(entry.clone_onto(next, guard)));
            }
        }
        Self {
            buckets: heads
                .into_iter()
                .map(|head| head.map_or_else(AtomicShared::null, AtomicShared::from))
                .collect(),
        }
    }
}
