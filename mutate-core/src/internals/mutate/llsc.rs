//! Load-Link/Store-Conditional backend, for aarch64.
//!
//! The attempt establishes an exclusive reservation on the value with a load-acquire exclusive, and commits the
//! transformed value with a store-release exclusive, which fails if the reservation was lost in the meantime. Any
//! interleaved store to the granule loses the reservation, hence the backend is immune to ABA.
//!
//! The exclusive instructions only carry acquire and release semantics respectively; stronger orderings are enforced
//! by fences issued immediately before the load and the store.

use core::{arch::asm, sync::atomic::Ordering};

use super::{AtomicWord, Word};
use super::super::ordering;

unsafe impl Word for u32 {
    #[inline(always)]
    unsafe fn load_linked(ptr: *const u32) -> u32 {
        let value: u32;

        asm!("ldaxr {value:w}, [{ptr}]", ptr = in(reg) ptr, value = out(reg) value, options(nostack));

        value
    }

    #[inline(always)]
    unsafe fn store_conditional(ptr: *mut u32, value: u32) -> bool {
        let status: u32;

        asm!("stlxr {status:w}, {value:w}, [{ptr}]",
            ptr = in(reg) ptr, value = in(reg) value, status = out(reg) status, options(nostack));

        status == 0
    }
}

unsafe impl Word for u64 {
    #[inline(always)]
    unsafe fn load_linked(ptr: *const u64) -> u64 {
        let value: u64;

        asm!("ldaxr {value}, [{ptr}]", ptr = in(reg) ptr, value = out(reg) value, options(nostack));

        value
    }

    #[inline(always)]
    unsafe fn store_conditional(ptr: *mut u64, value: u64) -> bool {
        let status: u32;

        asm!("stlxr {status:w}, {value}, [{ptr}]",
            ptr = in(reg) ptr, value = in(reg) value, status = out(reg) status, options(nostack));

        status == 0
    }
}

//  aarch64 pointers are 64 bits wide.
unsafe impl Word for usize {
    #[inline(always)]
    unsafe fn load_linked(ptr: *const usize) -> usize { u64::load_linked(ptr as *const u64) as usize }

    #[inline(always)]
    unsafe fn store_conditional(ptr: *mut usize, value: usize) -> bool {
        u64::store_conditional(ptr as *mut u64, value as u64)
    }
}

unsafe impl<T> Word for *mut T {
    #[inline(always)]
    unsafe fn load_linked(ptr: *const *mut T) -> *mut T { u64::load_linked(ptr as *const u64) as usize as *mut T }

    #[inline(always)]
    unsafe fn store_conditional(ptr: *mut *mut T, value: *mut T) -> bool {
        u64::store_conditional(ptr as *mut u64, value as usize as u64)
    }
}

/// Attempts to transform the value of `atomic`.
///
/// Returns true if the transformed value was committed, false if `transform` declined or the reservation was lost.
#[inline(always)]
pub(crate) fn mutate_explicit<A, F>(atomic: &A, transform: F, load_order: Ordering, store_order: Ordering) -> bool
    where
        A: AtomicWord,
        F: FnOnce(A::Value) -> Option<A::Value>,
{
    let ptr = atomic.as_ptr();

    ordering::fence(load_order);

    //  Safety:
    //  -   `ptr` points to the storage of `atomic`, which is valid and suitably aligned.
    let current = unsafe { A::Value::load_linked(ptr) };

    let new = match transform(current) {
        Some(new) => new,
        None => {
            clear_exclusive();
            return false;
        },
    };

    ordering::fence(store_order);

    //  Safety:
    //  -   `ptr` points to the storage of `atomic`, which is valid and suitably aligned.
    //  -   `ptr` was the target of the latest `load_linked`, or the reservation was lost, and the store fails.
    unsafe { A::Value::store_conditional(ptr, new) }
}

//  Releases the reservation of an abandoned attempt.
#[inline(always)]
fn clear_exclusive() {
    //  Safety:
    //  -   Clearing the local monitor has no effect on memory.
    unsafe { asm!("clrex", options(nomem, nostack, preserves_flags)) };
}
