//! The atomic mutate primitive.
//!
//! A single attempt at transforming the value of an atomic word:
//!
//! 1.  Read the current value.
//! 2.  Invoke the transformation; if it declines, by returning `None`, the attempt is abandoned.
//! 3.  Commit the transformed value, if and only if no other thread interleaved.
//!
//! The attempt may fail spuriously, the caller is expected to retry in a loop. The transformation may therefore be
//! invoked any number of times, and must not have side-effects visible outside of the current thread.
//!
//! Two backends implement the attempt, selected at compile-time:
//!
//! -   Compare-And-Swap, available everywhere.
//! -   Load-Link/Store-Conditional, on aarch64, unless the `force-cas` feature is enabled.

use core::sync::atomic::{self, Ordering};

use crate::Backend;

/// A value fitting within a single atomic word.
///
/// #   Safety
///
/// On Load-Link/Store-Conditional targets, the exclusive accesses must be of the exact width of `Self`.
pub unsafe trait Word: Copy + Eq {
    /// Loads the value at `ptr`, and establishes an exclusive reservation over its granule.
    ///
    /// #   Safety
    ///
    /// -   Assumes `ptr` is valid and suitably aligned.
    #[cfg(all(target_arch = "aarch64", not(feature = "force-cas")))]
    unsafe fn load_linked(ptr: *const Self) -> Self;

    /// Stores `value` at `ptr`, if and only if the exclusive reservation is intact.
    ///
    /// Returns whether the store was committed.
    ///
    /// #   Safety
    ///
    /// -   Assumes `ptr` is valid and suitably aligned.
    /// -   Assumes `ptr` was the target of the latest `load_linked` on this thread.
    #[cfg(all(target_arch = "aarch64", not(feature = "force-cas")))]
    unsafe fn store_conditional(ptr: *mut Self, value: Self) -> bool;
}

/// An atomic word, the storage of the cells.
///
/// #   Safety
///
/// -   `as_ptr` must point to the storage of the value, for the lifetime of `self`.
pub unsafe trait AtomicWord: Send + Sync {
    /// The value stored.
    type Value: Word;

    /// Creates an instance.
    fn new(value: Self::Value) -> Self;

    /// Loads the value.
    fn load(&self, order: Ordering) -> Self::Value;

    /// Stores `new` if the value is still `current`; may fail spuriously.
    fn compare_exchange_weak(&self, current: Self::Value, new: Self::Value, success: Ordering, failure: Ordering)
        -> Result<Self::Value, Self::Value>;

    /// Returns a pointer to the storage of the value.
    fn as_ptr(&self) -> *mut Self::Value;
}

macro_rules! atomic_word {
    ($atomic:ty, $value:ty) => {
        unsafe impl AtomicWord for $atomic {
            type Value = $value;

            fn new(value: $value) -> Self { <$atomic>::new(value) }

            #[inline(always)]
            fn load(&self, order: Ordering) -> $value { <$atomic>::load(self, order) }

            #[inline(always)]
            fn compare_exchange_weak(&self, current: $value, new: $value, success: Ordering, failure: Ordering)
                -> Result<$value, $value>
            {
                <$atomic>::compare_exchange_weak(self, current, new, success, failure)
            }

            #[inline(always)]
            fn as_ptr(&self) -> *mut $value { <$atomic>::as_ptr(self) }
        }
    };
}

atomic_word!(atomic::AtomicU32, u32);
#[cfg(target_has_atomic = "64")]
atomic_word!(atomic::AtomicU64, u64);
atomic_word!(atomic::AtomicUsize, usize);

unsafe impl<T> AtomicWord for atomic::AtomicPtr<T> {
    type Value = *mut T;

    fn new(value: *mut T) -> Self { atomic::AtomicPtr::new(value) }

    #[inline(always)]
    fn load(&self, order: Ordering) -> *mut T { atomic::AtomicPtr::load(self, order) }

    #[inline(always)]
    fn compare_exchange_weak(&self, current: *mut T, new: *mut T, success: Ordering, failure: Ordering)
        -> Result<*mut T, *mut T>
    {
        atomic::AtomicPtr::compare_exchange_weak(self, current, new, success, failure)
    }

    #[inline(always)]
    fn as_ptr(&self) -> *mut *mut T { atomic::AtomicPtr::as_ptr(self) }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "aarch64", not(feature = "force-cas")))] {
        mod llsc;

        pub(crate) use llsc::mutate_explicit;

        pub(crate) const BACKEND: Backend = Backend::LoadLinkStoreConditional;
    } else {
        mod cas;

        pub(crate) use cas::mutate_explicit;

        pub(crate) const BACKEND: Backend = Backend::CompareAndSwap;
    }
}

// mod tests
