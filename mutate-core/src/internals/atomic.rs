//! Building brick for the links of the Lifo.

use core::{
    ptr::{self, NonNull},
    sync::atomic::{self, Ordering},
};

//  Automatically uses Relaxed.
//
//  A link may be read by a thread attempting to pop its node while the node is being recycled by another. The value
//  read is then discarded, as the attempt fails, hence the read needs to be free of data-races and nothing more.
//  Publication of the link is handled by the Release store of the list head.
pub(crate) struct AtomicLink<T>(atomic::AtomicPtr<T>);

impl<T> AtomicLink<T> {
    pub(crate) fn load(&self) -> Option<NonNull<T>> { NonNull::new(self.0.load(Ordering::Relaxed)) }

    pub(crate) fn store(&self, ptr: Option<NonNull<T>>) { self.0.store(into_raw(ptr), Ordering::Relaxed) }
}

impl<T> Default for AtomicLink<T> {
    fn default() -> Self { Self(atomic::AtomicPtr::new(ptr::null_mut())) }
}

/// Converts an optional pointer into a possibly null raw pointer.
#[inline(always)]
pub(crate) fn into_raw<T>(ptr: Option<NonNull<T>>) -> *mut T {
    ptr.map(|t| t.as_ptr())
        .unwrap_or(ptr::null_mut())
}

// mod tests
