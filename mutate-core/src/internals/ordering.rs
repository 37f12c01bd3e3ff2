//! Adjustments of memory orderings.
//!
//! The mutate primitive accepts any ordering for both its load and its store, whereas the hardware primitives do not.

use core::sync::atomic::Ordering;

/// Returns the ordering to use for a load requested with `order`.
///
/// Release semantics do not apply to a load, and are dropped.
#[inline(always)]
pub(crate) fn load(order: Ordering) -> Ordering {
    match order {
        Ordering::Release => Ordering::Relaxed,
        Ordering::AcqRel => Ordering::Acquire,
        order => order,
    }
}

/// Issues a fence of the requested ordering, unless relaxed.
#[cfg(any(test, all(target_arch = "aarch64", not(feature = "force-cas"))))]
#[inline(always)]
pub(crate) fn fence(order: Ordering) {
    if order != Ordering::Relaxed {
        core::sync::atomic::fence(order);
    }
}

// mod tests
