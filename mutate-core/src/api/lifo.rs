//! A lock-free stack of borrowed values, recycling its nodes.
//!
//! #   Design
//!
//! The stack is made of two lists of nodes: the active list, holding the pushed values, and the free list, holding
//! the nodes not in use. Popping moves the top node of the active list onto the free list, pushing moves a node from
//! the free list onto the active list, or allocates one if the free list is empty.
//!
//! Nodes are never returned to the platform until the stack is dropped, hence a node observed at the head of a list
//! can always be read, even if it was popped by another thread in the meantime. This sidesteps safe memory reclamation
//! entirely, at the cost of holding onto the peak number of nodes.
//!
//! Both list heads are `TaggedPtr`, so that a node popped and pushed back in between the load and the commit of
//! another thread is detected.
//!
//! #   Safety
//!
//! The stack does not own the values, it only borrows them for `'a`; see the signature of `push`.
//!
//! `'a` is invariant: a `Lifo<'static, T, ...>` cannot be viewed as a `Lifo<'short, T, ...>`, as it would then accept
//! short-lived references and hand them back as `&'static T`.
//!
//! ```compile_fail
//! use mutate_core::{Lifo, Platform};
//!
//! fn shorten<'s, C, P: Platform>(lifo: &'s Lifo<'static, u32, C, P>) -> &'s Lifo<'s, u32, C, P> { lifo }
//! ```

use core::{
    alloc::Layout,
    fmt,
    marker::PhantomData,
    ptr::{self, NonNull},
    sync::atomic::Ordering,
};

use crate::{AtomicCell, Configuration, Platform, TaggedPtr};
use crate::internals::{atomic::into_raw, backoff::Backoff, node::Node};

/// Exhausted
///
/// Error returned when a `Lifo` requires a new node, and cannot get one.
///
/// Either the `Platform` failed to allocate the node, or the `Configuration` forbids allocating any further node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Exhausted {
    /// The number of nodes allocated so far.
    pub allocated: usize,
}

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot allocate a node, {} already allocated", self.allocated)
    }
}

/// Census
///
/// The distribution of the nodes of a `Lifo`, at a point of quiescence.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Census {
    /// The number of nodes in the active list, ie the number of values in the stack.
    pub active: usize,
    /// The number of nodes in the free list.
    pub free: usize,
    /// The number of nodes allocated over the lifetime of the stack.
    pub allocated: usize,
}

impl Census {
    /// Returns whether every allocated node is in exactly one of the lists.
    pub fn is_conserved(&self) -> bool { self.active + self.free == self.allocated }
}

/// Lifo
///
/// A lock-free stack of references to `T`, borrowed for `'a`.
///
/// #   Example
///
/// ```
/// use core::{alloc::Layout, ptr::NonNull};
/// use std::alloc;
///
/// use mutate_core::{Configuration, Lifo, Platform};
///
/// struct Config;
///
/// impl Configuration for Config {
///     const SPIN_LIMIT: u32 = 6;
///     const MAXIMUM_NODES: usize = usize::MAX;
/// }
///
/// struct System;
///
/// impl Platform for System {
///     unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> { NonNull::new(alloc::alloc(layout)) }
///
///     unsafe fn deallocate(&self, pointer: NonNull<u8>, layout: Layout) { alloc::dealloc(pointer.as_ptr(), layout) }
///
///     fn yield_now(&self) { std::thread::yield_now() }
/// }
///
/// let (a, b) = (1, 2);
///
/// let lifo: Lifo<'_, i32, Config, System> = Lifo::new(System);
///
/// lifo.push(&a).unwrap();
/// lifo.push(&b).unwrap();
///
/// assert_eq!(Some(&b), lifo.pop());
/// assert_eq!(Some(&a), lifo.pop());
/// assert_eq!(None, lifo.pop());
/// ```
pub struct Lifo<'a, T, C, P>
    where
        P: Platform,
{
    //  The active list.
    head: TaggedPtr<Node<T>>,
    //  The list of nodes available for re-use.
    free_list: TaggedPtr<Node<T>>,
    //  The number of nodes allocated, ever.
    allocated: AtomicCell<usize>,
    platform: P,
    //  Invariant in `'a`, and `Send`/`Sync` only if `T: Sync`.
    _marker: PhantomData<(&'a T, fn(&'a T) -> &'a T, C)>,
}

impl<'a, T, C, P> Lifo<'a, T, C, P>
    where
        P: Platform,
{
    /// Creates an empty instance, allocating through `platform`.
    pub fn new(platform: P) -> Self {
        let head = TaggedPtr::null();
        let free_list = TaggedPtr::null();
        let allocated = AtomicCell::new(0);
        let _marker = PhantomData;

        Self { head, free_list, allocated, platform, _marker, }
    }

    /// Returns a reference to the platform.
    pub fn platform(&self) -> &P { &self.platform }

    /// Returns whether the stack is empty, or not.
    ///
    /// In the presence of concurrent modifications, the result may be stale by the time it is returned.
    pub fn is_empty(&self) -> bool { self.head.load(Ordering::Relaxed).is_null() }

    /// Returns the number of nodes allocated over the lifetime of the stack.
    pub fn allocated(&self) -> usize { self.allocated.load(Ordering::Relaxed) }

    /// Returns the distribution of the nodes.
    ///
    /// Exclusive access guarantees that no other thread is modifying the lists.
    pub fn census(&mut self) -> Census {
        //  Safety:
        //  -   Exclusive access.
        let (active, free) = unsafe { (Self::count(&self.head), Self::count(&self.free_list)) };
        let allocated = self.allocated();

        Census { active, free, allocated }
    }

    //  Internal.
    //
    //  #   Safety
    //
    //  -   Assumes no concurrent modification of the list.
    unsafe fn count(list: &TaggedPtr<Node<T>>) -> usize {
        let mut count = 0;
        let mut current = NonNull::new(list.load(Ordering::Acquire));

        while let Some(node) = current {
            count += 1;
            current = node.as_ref().next();
        }

        count
    }
}

impl<'a, T, C, P> Lifo<'a, T, C, P>
    where
        C: Configuration,
        P: Platform,
{
    /// Pushes a reference on top of the stack.
    ///
    /// A node is recycled from the free list if possible, and allocated otherwise.
    ///
    /// #   Errors
    ///
    /// Returns `Exhausted` if a node is needed, and cannot be allocated; the stack is then left unmodified.
    pub fn push(&self, value: &'a T) -> Result<(), Exhausted> {
        let mut backoff = Backoff::<C, P>::new(&self.platform);

        let node = match Self::take(&self.free_list, Ordering::Acquire, Ordering::Relaxed, &mut backoff) {
            Some(node) => node,
            None => self.allocate()?,
        };

        //  Safety:
        //  -   `node` is valid, as nodes are only deallocated on drop.
        //  -   `node` is exclusively owned by this thread until spliced.
        unsafe { node.as_ref() }.set_payload(NonNull::from(value));

        Self::splice(&self.head, node, &mut backoff);

        Ok(())
    }

    /// Pops the reference on top of the stack, if any.
    ///
    /// The node is moved to the free list, for re-use.
    pub fn pop(&self) -> Option<&'a T> {
        let mut backoff = Backoff::<C, P>::new(&self.platform);

        let node = Self::take(&self.head, Ordering::Acquire, Ordering::Release, &mut backoff)?;

        //  Safety:
        //  -   `node` is valid, as nodes are only deallocated on drop.
        //  -   `node` is exclusively owned by this thread until spliced.
        let payload = unsafe { node.as_ref() }.take_payload();

        Self::splice(&self.free_list, node, &mut backoff);

        debug_assert!(payload.is_some(), "Active node without payload");

        //  Safety:
        //  -   `payload` was obtained from a `&'a T` in `push`.
        payload.map(|payload| unsafe { &*payload.as_ptr() })
    }

    //  Internal.
    //
    //  Takes the top node of `list`, unless it is observed empty.
    fn take(list: &TaggedPtr<Node<T>>, load: Ordering, store: Ordering, backoff: &mut Backoff<'_, C, P>)
        -> Option<NonNull<Node<T>>>
    {
        while !list.load(Ordering::Relaxed).is_null() {
            let mut top = None;

            let taken = list.mutate_explicit(|head| {
                top = NonNull::new(head);

                //  Safety:
                //  -   `head` is valid, as nodes are only deallocated on drop. It may not be on `list` any longer, in
                //      which case `next` is stale, and the commit fails.
                top.map(|head| into_raw(unsafe { head.as_ref() }.next()))
            }, load, store);

            if taken {
                return top;
            }

            backoff.snooze();
        }

        None
    }

    //  Internal.
    //
    //  Splices `node` on top of `list`.
    fn splice(list: &TaggedPtr<Node<T>>, node: NonNull<Node<T>>, backoff: &mut Backoff<'_, C, P>) {
        loop {
            let spliced = list.mutate_explicit(|head| {
                //  Safety:
                //  -   `node` is exclusively owned by this thread until spliced.
                unsafe { node.as_ref() }.set_next(NonNull::new(head));

                Some(node.as_ptr())
            }, Ordering::Relaxed, Ordering::Release);

            if spliced {
                return;
            }

            backoff.snooze();
        }
    }

    //  Internal.
    #[cold]
    #[inline(never)]
    fn allocate(&self) -> Result<NonNull<Node<T>>, Exhausted> {
        self.reserve()?;

        //  Safety:
        //  -   `Node<T>` is not zero-sized, as it contains pointers.
        let pointer = unsafe { self.platform.allocate(Self::node_layout()) };

        let pointer = match pointer {
            Some(pointer) => pointer.cast::<Node<T>>(),
            None => {
                self.unreserve();
                return Err(Exhausted { allocated: self.allocated() });
            },
        };

        //  Safety:
        //  -   `pointer` is valid for writes, and suitably aligned, as per `Platform::allocate`.
        unsafe { ptr::write(pointer.as_ptr(), Node::new()) };

        Ok(pointer)
    }

    //  Internal.
    //
    //  Reserves one more node, within the limits of the configuration.
    fn reserve(&self) -> Result<(), Exhausted> {
        loop {
            let allocated = self.allocated.load(Ordering::Relaxed);

            if allocated >= C::MAXIMUM_NODES {
                return Err(Exhausted { allocated });
            }

            let reserved = self.allocated.mutate_explicit(
                |allocated| if allocated < C::MAXIMUM_NODES { Some(allocated + 1) } else { None },
                Ordering::Relaxed,
                Ordering::Relaxed);

            if reserved {
                return Ok(());
            }
        }
    }

    //  Internal.
    fn unreserve(&self) {
        while !self.allocated.mutate_explicit(|allocated| Some(allocated - 1), Ordering::Relaxed, Ordering::Relaxed) {}
    }
}

impl<'a, T, C, P> Lifo<'a, T, C, P>
    where
        P: Platform,
{
    //  Internal.
    fn node_layout() -> Layout { Layout::new::<Node<T>>() }

    //  Internal.
    //
    //  #   Safety
    //
    //  -   Assumes no concurrent access to the list, nor to its nodes, ever after.
    unsafe fn release(&self, list: &TaggedPtr<Node<T>>) {
        let mut current = NonNull::new(list.load(Ordering::Acquire));

        while let Some(node) = current {
            current = node.as_ref().next();

            ptr::drop_in_place(node.as_ptr());
            self.platform.deallocate(node.cast(), Self::node_layout());
        }
    }
}

impl<'a, T, C, P> Default for Lifo<'a, T, C, P>
    where
        P: Platform + Default,
{
    fn default() -> Self { Self::new(P::default()) }
}

impl<'a, T, C, P> fmt::Debug for Lifo<'a, T, C, P>
    where
        P: Platform,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifo")
            .field("head", &self.head)
            .field("free_list", &self.free_list)
            .field("allocated", &self.allocated())
            .finish()
    }
}

impl<'a, T, C, P> Drop for Lifo<'a, T, C, P>
    where
        P: Platform,
{
    fn drop(&mut self) {
        //  Safety:
        //  -   Exclusive access, for the remainder of the lifetime of the lists.
        unsafe {
            self.release(&self.head);
            self.release(&self.free_list);
        }
    }
}

// mod tests
