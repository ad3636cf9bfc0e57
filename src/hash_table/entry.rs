//! [`Entry`] is a node of a bucket chain.

use std::fmt::{self, Debug};
use std::ptr;

use sdd::{Guard, Shared};

use crate::key::KeyStrategy;
use crate::value::ValueKind;

/// [`Entry`] is an immutable node of a singly linked bucket chain.
///
/// Only the value cell may change once an entry is reachable from a bucket. A chain is modified
/// by building new nodes in front of an unchanged suffix, so a reader holding any node of a chain
/// always sees a consistent, finite tail.
pub(crate) struct Entry<S: KeyStrategy, C: ValueKind> {
    key: S::Key,
    hash: u32,
    cell: C::Cell,
    next: Option<Shared<Entry<S, C>>>,
}

impl<S: KeyStrategy, C: ValueKind> Entry<S, C> {
    /// Creates a new [`Entry`] in front of `next`.
    #[inline]
    pub(crate) const fn new(
        key: S::Key,
        hash: u32,
        cell: C::Cell,
        next: Option<Shared<Entry<S, C>>>,
    ) -> Self {
        Self {
            key,
            hash,
            cell,
            next,
        }
    }

    /// Returns a reference to the key.
    #[inline]
    pub(crate) const fn key(&self) -> &S::Key {
        &self.key
    }

    /// Returns the cached hash of the key.
    #[inline]
    pub(crate) const fn hash(&self) -> u32 {
        self.hash
    }

    /// Returns a reference to the value cell.
    #[inline]
    pub(crate) const fn cell(&self) -> &C::Cell {
        &self.cell
    }

    /// Returns the next node in the chain.
    #[inline]
    pub(crate) const fn next(&self) -> Option<&Shared<Entry<S, C>>> {
        self.next.as_ref()
    }

    /// Returns the next entry in the chain.
    #[inline]
    pub(crate) fn next_entry(&self) -> Option<&Self> {
        self.next.as_deref()
    }

    /// Returns `true` if this entry holds the key.
    #[inline]
    pub(crate) fn matches(&self, key: &S::Probe, hash: u32) -> bool {
        self.hash == hash && S::matches(key, &self.key)
    }

    /// Searches the chain starting at `self` for the key.
    #[inline]
    pub(crate) fn find(&self, key: &S::Probe, hash: u32) -> Option<&Self> {
        let mut current = Some(self);
        while let Some(entry) = current {
            if entry.matches(key, hash) {
                return Some(entry);
            }
            current = entry.next.as_deref();
        }
        None
    }

    /// Creates a copy of this entry in front of another chain.
    #[inline]
    pub(crate) fn clone_onto(&self, next: Option<Shared<Entry<S, C>>>, guard: &Guard) -> Self {
        Self::new(self.key.clone(), self.hash, C::fork(&self.cell, guard), next)
    }

    /// Builds the chain that results from removing `target` from the chain headed by `first`.
    ///
    /// Every node after `target` is reused as is, and every node before it is cloned in the
    /// original order. Neither the original chain nor any of its nodes is modified.
    pub(crate) fn unlink(
        first: &Shared<Entry<S, C>>,
        target: &Entry<S, C>,
        guard: &Guard,
    ) -> Option<Shared<Entry<S, C>>> {
        let mut prefix = Vec::new();
        let mut current: Option<&Entry<S, C>> = Some(&**first);
        while let Some(entry) = current {
            if ptr::eq(entry, target) {
                break;
            }
            prefix.push(entry);
            current = entry.next.as_deref();
        }
        prefix
            .into_iter()
            .rev()
            .fold(target.next.clone(), |next, entry| {
                Some(Shared::new(entry.clone_onto(next, guard)))
            })
    }
}

impl<S, C> Debug for Entry<S, C>
where
    S: KeyStrategy,
    S::Key: Debug,
    C: ValueKind,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("hash", &self.hash)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}
