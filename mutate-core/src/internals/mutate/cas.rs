//! Compare-And-Swap backend.
//!
//! The attempt loads the current value, and commits the transformed value with a weak Compare-And-Swap from the value
//! observed. It is subject to ABA: a value changed and changed back in the meantime is not detected, callers which
//! care must make every committed value unique, as `TaggedPtr` does.

use core::sync::atomic::Ordering;

use super::{AtomicWord, Word};
use super::super::ordering;

unsafe impl Word for u32 {}

unsafe impl Word for u64 {}

unsafe impl Word for usize {}

#[cfg(target_pointer_width = "64")]
unsafe impl Word for u128 {}

unsafe impl<T> Word for *mut T {}

#[cfg(target_pointer_width = "64")]
atomic_word!(portable_atomic::AtomicU128, u128);

#[cfg(target_pointer_width = "32")]
atomic_word!(portable_atomic::AtomicU64, u64);

/// Attempts to transform the value of `atomic`.
///
/// Returns true if the transformed value was committed, false if `transform` declined or the attempt failed.
#[inline(always)]
pub(crate) fn mutate_explicit<A, F>(atomic: &A, transform: F, load_order: Ordering, store_order: Ordering) -> bool
    where
        A: AtomicWord,
        F: FnOnce(A::Value) -> Option<A::Value>,
{
    let current = atomic.load(ordering::load(load_order));

    let new = match transform(current) {
        Some(new) => new,
        None => return false,
    };

    atomic.compare_exchange_weak(current, new, store_order, Ordering::Relaxed).is_ok()
}
