//! TaggedPtr
//!
//! An atomic pointer which can be transformed without suffering from ABA.
//!
//! With Compare-And-Swap, a pointer swapped away and back again in between the load and the commit of a
//! transformation goes undetected: the so-called ABA problem. To detect it, the pointer is paired with a tag in a
//! double-word, the tag being incremented on every commit, and the whole double-word is compared and swapped at once.
//!
//! With Load-Link/Store-Conditional, any interleaved store is detected by the loss of the reservation, hence the
//! pointer is stored on its own.

use core::{
    fmt,
    marker::PhantomData,
    sync::atomic::Ordering,
};

use crate::internals::{mutate, ordering};

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "aarch64", not(feature = "force-cas")))] {
        type AtomicPair = core::sync::atomic::AtomicUsize;
        type Pair = usize;

        #[inline(always)]
        fn pack(pointer: usize, _tag: usize) -> Pair { pointer }

        #[inline(always)]
        fn unpack(pair: Pair) -> (usize, usize) { (pair, 0) }
    } else if #[cfg(target_pointer_width = "64")] {
        type AtomicPair = portable_atomic::AtomicU128;
        type Pair = u128;

        #[inline(always)]
        fn pack(pointer: usize, tag: usize) -> Pair { (pointer as u128) | ((tag as u128) << 64) }

        #[inline(always)]
        fn unpack(pair: Pair) -> (usize, usize) { (pair as usize, (pair >> 64) as usize) }
    } else if #[cfg(target_pointer_width = "32")] {
        type AtomicPair = portable_atomic::AtomicU64;
        type Pair = u64;

        #[inline(always)]
        fn pack(pointer: usize, tag: usize) -> Pair { (pointer as u64) | ((tag as u64) << 32) }

        #[inline(always)]
        fn unpack(pair: Pair) -> (usize, usize) { (pair as usize, (pair >> 32) as usize) }
    } else {
        compile_error!("unsupported pointer width");
    }
}

/// TaggedPtr
///
/// An atomic pointer to `T`, paired with a tag on Compare-And-Swap backends.
///
/// The tag is incremented, wrapping around, on every committed transformation; it is always 0 on Load-Link/Store-
/// Conditional backends.
pub struct TaggedPtr<T> {
    pair: AtomicPair,
    _marker: PhantomData<*mut T>,
}

impl<T> TaggedPtr<T> {
    /// Creates a null instance.
    pub const fn null() -> Self { Self { pair: AtomicPair::new(0), _marker: PhantomData } }

    /// Creates an instance pointing to `pointer`, with a tag of 0.
    pub fn new(pointer: *mut T) -> Self {
        Self { pair: AtomicPair::new(pack(pointer as usize, 0)), _marker: PhantomData }
    }

    /// Loads the pointer, with the requested ordering.
    ///
    /// Release semantics, which do not apply to a load, are ignored.
    pub fn load(&self, order: Ordering) -> *mut T { unpack(self.load_pair(order)).0 as *mut T }

    /// Loads the pointer, sequentially consistent.
    pub fn get(&self) -> *mut T { self.load(Ordering::SeqCst) }

    /// Loads the tag, with the requested ordering.
    pub fn tag(&self, order: Ordering) -> usize { unpack(self.load_pair(order)).1 }

    /// Attempts to transform the pointer.
    ///
    /// `transform` is invoked with the current pointer, loaded with `load_order`:
    ///
    /// -   If it returns `None`, the attempt is abandoned, and false is returned.
    /// -   If it returns a pointer, the pointer is committed with `store_order` if neither the pointer nor the tag were
    ///     modified since the load, and true is returned. Otherwise false is returned.
    ///
    /// The attempt may fail spuriously; it is up to the caller to retry. On failure, the pointer is left untouched.
    #[inline]
    pub fn mutate_explicit<F>(&self, transform: F, load_order: Ordering, store_order: Ordering) -> bool
        where
            F: FnOnce(*mut T) -> Option<*mut T>,
    {
        mutate::mutate_explicit(
            &self.pair,
            |pair| {
                let (pointer, tag) = unpack(pair);
                transform(pointer as *mut T).map(|new| pack(new as usize, tag.wrapping_add(1)))
            },
            load_order,
            store_order)
    }

    /// Attempts to transform the pointer, sequentially consistent.
    ///
    /// See `mutate_explicit`.
    #[inline]
    pub fn mutate<F>(&self, transform: F) -> bool
        where
            F: FnOnce(*mut T) -> Option<*mut T>,
    {
        self.mutate_explicit(transform, Ordering::SeqCst, Ordering::SeqCst)
    }

    //  Internal.
    fn load_pair(&self, order: Ordering) -> Pair { self.pair.load(ordering::load(order)) }
}

impl<T> Default for TaggedPtr<T> {
    fn default() -> Self { Self::null() }
}

impl<T> fmt::Debug for TaggedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (pointer, tag) = unpack(self.load_pair(Ordering::Relaxed));

        f.debug_struct("TaggedPtr")
            .field("pointer", &(pointer as *mut T))
            .field("tag", &tag)
            .finish()
    }
}

//  Safety:
//  -   Like `AtomicPtr`, the pointer is only ever accessed atomically, and never dereferenced.
unsafe impl<T> Send for TaggedPtr<T> {}

//  Safety:
//  -   Like `AtomicPtr`, the pointer is only ever accessed atomically, and never dereferenced.
unsafe impl<T> Sync for TaggedPtr<T> {}

#[cfg(test)]
mod tests {

use core::ptr;

use std::{sync::atomic::AtomicUsize, vec::Vec};

use mutate_test::BurstyBuilder;

use crate::BACKEND;

use super::*;

//  Retries until committed, or declined.
fn mutate_with_retry<T, F>(tagged: &TaggedPtr<T>, transform: F) -> bool
    where
        F: Fn(*mut T) -> Option<*mut T>,
{
    loop {
        let mut declined = false;

        let committed = tagged.mutate(|pointer| {
            let result = transform(pointer);
            declined = result.is_none();
            result
        });

        if committed || declined {
            return committed;
        }
    }
}

#[test]
fn tagged_ptr_send_sync() {
    fn ensure_send<T: Send>() {}
    fn ensure_sync<T: Sync>() {}

    ensure_send::<TaggedPtr<*mut u8>>();
    ensure_sync::<TaggedPtr<*mut u8>>();
}

#[cfg(not(all(target_arch = "aarch64", not(feature = "force-cas"))))]
#[test]
fn tagged_ptr_is_lock_free() {
    assert!(AtomicPair::is_lock_free());
}

#[test]
fn tagged_ptr_null() {
    let tagged = TaggedPtr::<u8>::null();

    assert!(tagged.get().is_null());
    assert_eq!(0, tagged.tag(Ordering::SeqCst));

    let tagged = TaggedPtr::<u8>::default();

    assert!(tagged.load(Ordering::Release).is_null());
}

#[test]
fn tagged_ptr_load_get() {
    let mut tmp = 3i32;
    let tmp: *mut i32 = &mut tmp;

    let tagged = TaggedPtr::new(tmp);

    assert_eq!(tmp, tagged.get());
    assert_eq!(tmp, tagged.load(Ordering::Relaxed));
    assert_eq!(tmp, tagged.load(Ordering::Acquire));
    assert_eq!(tmp, tagged.load(Ordering::AcqRel));
}

#[test]
fn tagged_ptr_mutate() {
    let mut tmp = 3i32;
    let tmp: *mut i32 = &mut tmp;

    let tagged = TaggedPtr::null();

    assert!(mutate_with_retry(&tagged, |_| Some(tmp)));
    assert_eq!(tmp, tagged.get());

    assert!(mutate_with_retry(&tagged, |_| Some(ptr::null_mut())));
    assert!(tagged.get().is_null());
}

#[test]
fn tagged_ptr_mutate_decline() {
    let mut tmp = 3i32;
    let tmp: *mut i32 = &mut tmp;

    let tagged = TaggedPtr::new(tmp);

    assert!(!tagged.mutate_explicit(|_| None, Ordering::Acquire, Ordering::Release));

    assert_eq!(tmp, tagged.get());
    assert_eq!(0, tagged.tag(Ordering::SeqCst));
}

#[test]
fn tagged_ptr_tag_bumped_on_commit() {
    let mut tmp = 3i32;
    let tmp: *mut i32 = &mut tmp;

    let tagged = TaggedPtr::new(tmp);

    //  Swap to the same pointer: only the tag distinguishes the states.
    for _ in 0..3 {
        assert!(mutate_with_retry(&tagged, |pointer| Some(pointer)));
    }

    assert_eq!(tmp, tagged.get());

    let expected = if BACKEND.is_tagged() { 3 } else { 0 };
    assert_eq!(expected, tagged.tag(Ordering::SeqCst));
}

#[test]
fn tagged_ptr_debug() {
    let tagged = TaggedPtr::<u8>::null();

    assert_eq!("TaggedPtr { pointer: 0x0, tag: 0 }", format!("{:?}", tagged));
}

#[test]
fn tagged_ptr_concurrent_mutate() {
    //  The test aims at validating that concurrent transformations of the pointer are neither lost, nor duplicated.
    //
    //  The pointer walks an array of counters, each commit moving it one slot forward and wrapping around, whilst
    //  each committing thread bumps the counter of the slot it moved away from. At the end, the position of the
    //  pointer is consistent with the total number of commits, and every slot was left exactly as many times as
    //  expected.
    const THREADS: usize = 4;
    const SLOTS: usize = 8;
    const MOVES: usize = 250;

    struct Global {
        slots: Vec<AtomicUsize>,
        tagged: TaggedPtr<AtomicUsize>,
    }

    let slots: Vec<_> = (0..SLOTS).map(|_| AtomicUsize::new(0)).collect();
    let tagged = TaggedPtr::new(&slots[0] as *const AtomicUsize as *mut AtomicUsize);

    let mut builder = BurstyBuilder::new(Global { slots, tagged }, vec!((); THREADS));

    builder.add_step(|global: &Global, _: &mut ()| {
        let base = global.slots.as_ptr() as *mut AtomicUsize;

        for _ in 0..MOVES {
            let mut left = ptr::null_mut();

            while !global.tagged.mutate(|pointer| {
                left = pointer;

                //  Safety:
                //  -   `pointer` always points within `slots`.
                let index = unsafe { pointer.offset_from(base) } as usize;

                Some(unsafe { base.add((index + 1) % SLOTS) })
            }) {}

            //  Safety:
            //  -   `left` points within `slots`.
            unsafe { &*left }.fetch_add(1, Ordering::Relaxed);
        }
    });

    let (global, _) = builder.launch(1).join();

    let total = THREADS * MOVES;
    let base = global.slots.as_ptr() as *mut AtomicUsize;

    //  Safety:
    //  -   The pointer always points within `slots`.
    let index = unsafe { global.tagged.get().offset_from(base) } as usize;

    assert_eq!(total % SLOTS, index);

    for slot in &global.slots {
        assert_eq!(total / SLOTS, slot.load(Ordering::Relaxed));
    }

    if BACKEND.is_tagged() {
        assert_eq!(total, global.tagged.tag(Ordering::SeqCst));
    }
}

} // mod tests
