//! Value kinds stored in entries.
//!
//! The value of an entry is the only part of it that can change after the entry is linked into
//! a bucket chain. Each [`ValueKind`] defines a cell that is updated in place, atomically, while
//! lock-free readers may be looking at it.

use std::marker::PhantomData;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::sync::atomic::{AtomicI32, AtomicI64};

use sdd::{AtomicShared, Guard, Shared, Tag};

/// The shape of the values held by a map.
pub trait ValueKind: 'static {
    /// The value supplied by callers.
    type Value: Send + Sync + 'static;

    /// The value handed back to callers by reads.
    type Output: Clone;

    /// The in-place mutable storage of a value inside an entry.
    type Cell: Send + Sync + 'static;

    /// Creates a new cell holding the value.
    fn new_cell(value: Self::Value) -> Self::Cell;

    /// Creates a new cell holding the current value of `cell`, for a cloned entry.
    fn fork(cell: &Self::Cell, guard: &Guard) -> Self::Cell;

    /// Reads the value.
    ///
    /// Returns `None` if the cell does not hold a value yet.
    fn load(cell: &Self::Cell, guard: &Guard) -> Option<Self::Output>;

    /// Replaces the value, returning the previous one.
    fn store(cell: &Self::Cell, value: Self::Value) -> Option<Self::Output>;

    /// Borrows the logical value out of an output.
    fn borrow(output: &Self::Output) -> &Self::Value;
}

/// Counter values supporting in-place arithmetic.
pub trait Counter: ValueKind {
    /// The unit amount.
    const ONE: Self::Value;

    /// Returns `true` if the amount is greater than zero.
    fn is_positive(amount: &Self::Value) -> bool;

    /// Returns `true` if the value is zero.
    fn is_zero(value: &Self::Output) -> bool;

    /// Negates an amount.
    fn negate(amount: Self::Value) -> Self::Value;

    /// Reads the counter.
    fn get(cell: &Self::Cell) -> Self::Output;

    /// Adds `delta` to the cell with wrapping arithmetic, and returns the new value.
    fn add(cell: &Self::Cell, delta: Self::Value) -> Self::Output;
}

/// Arbitrary values shared through [`Shared`] handles.
///
/// Readers receive a clone of the handle, so the value stays alive for as long as any reader
/// holds it even if the entry is updated or removed.
pub struct ObjectValue<V>(PhantomData<fn() -> V>);

/// `i32` counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntCounter;

/// `i64` counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct LongCounter;

impl<V: Send + Sync + 'static> ValueKind for ObjectValue<V> {
    type Value = V;
    type Output = Shared<V>;
    type Cell = AtomicShared<V>;

    #[inline]
    fn new_cell(value: V) -> AtomicShared<V> {
        AtomicShared::new(value)
    }

    #[inline]
    fn fork(cell: &AtomicShared<V>, guard: &Guard) -> AtomicShared<V> {
        cell.get_shared(Acquire, guard)
            .map_or_else(AtomicShared::null, AtomicShared::from)
    }

    #[inline]
    fn load(cell: &AtomicShared<V>, guard: &Guard) -> Option<Shared<V>> {
        cell.get_shared(Acquire, guard)
    }

    #[inline]
    fn store(cell: &AtomicShared<V>, value: V) -> Option<Shared<V>> {
        cell.swap((Some(Shared::new(value)), Tag::None), AcqRel).0
    }

    #[inline]
    fn borrow(output: &Shared<V>) -> &V {
        output
    }
}

macro_rules! counter_kind {
    ($kind:ty, $value:ty, $atomic:ty) => {
        impl ValueKind for $kind {
            type Value = $value;
            type Output = $value;
            type Cell = $atomic;

            #[inline]
            fn new_cell(value: $value) -> $atomic {
                <$atomic>::new(value)
            }

            #[inline]
            fn fork(cell: &$atomic, _guard: &Guard) -> $atomic {
                <$atomic>::new(cell.load(Acquire))
            }

            #[inline]
            fn load(cell: &$atomic, _guard: &Guard) -> Option<$value> {
                Some(cell.load(Acquire))
            }

            #[inline]
            fn store(cell: &$atomic, value: $value) -> Option<$value> {
                Some(cell.swap(value, AcqRel))
            }

            #[inline]
            fn borrow(output: &$value) -> &$value {
                output
            }
        }

        impl Counter for $kind {
            const ONE: $value = 1;

            #[inline]
            fn is_positive(amount: &$value) -> bool {
                *amount > 0
            }

            #[inline]
            fn is_zero(value: &$value) -> bool {
                *value == 0
            }

            #[inline]
            fn negate(amount: $value) -> $value {
                amount.wrapping_neg()
            }

            #[inline]
            fn get(cell: &$atomic) -> $value {
                cell.load(Acquire)
            }

            #[inline]
            fn add(cell: &$atomic, delta: $value) -> $value {
                // Atomic addition wraps around on overflow.
                cell.fetch_add(delta, Release).wrapping_add(delta)
            }
        }
    };
}

counter_kind!(IntCounter, i32, AtomicI32);
counter_kind!(LongCounter, i64, AtomicI64);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn object_fork_shares_value() {
        let guard = Guard::new();
        let cell = ObjectValue::<String>::new_cell("a".to_owned());
        let forked = ObjectValue::<String>::fork(&cell, &guard);
        let original = ObjectValue::<String>::load(&cell, &guard).unwrap();
        let copied = ObjectValue::<String>::load(&forked, &guard).unwrap();
        assert!(std::ptr::eq(original.as_ptr(), copied.as_ptr()));

        let previous = ObjectValue::<String>::store(&forked, "b".to_owned()).unwrap();
        assert_eq!(&*previous, "a");
        assert_eq!(&*ObjectValue::<String>::load(&cell, &guard).unwrap(), "a");
        assert_eq!(&*ObjectValue::<String>::load(&forked, &guard).unwrap(), "b");
    }

    #[test]
    fn counter_wraps() {
        let cell = IntCounter::new_cell(i32::MAX);
        assert_eq!(IntCounter::add(&cell, 1), i32::MIN);
        assert_eq!(LongCounter::negate(5), -5);
        assert_eq!(IntCounter::get(&cell), i32::MIN);
        assert!(!LongCounter::is_positive(&0));
        assert!(LongCounter::is_zero(&0));
    }
}
