//! Node of a Lifo.
//!
//! A node is exclusively owned by the thread which removed it from a list until it is spliced onto a list again; its
//! payload is only ever accessed by its owner. Its link, however, may be read by any thread which observed the node at
//! the head of a list, see `AtomicLink`.

use core::{
    cell::Cell,
    ptr::NonNull,
};

use super::atomic::AtomicLink;

/// Node
pub(crate) struct Node<T> {
    next: AtomicLink<Node<T>>,
    payload: Cell<Option<NonNull<T>>>,
}

impl<T> Node<T> {
    /// Creates an unlinked instance, with no payload.
    pub(crate) fn new() -> Self { Self { next: AtomicLink::default(), payload: Cell::new(None) } }

    /// Returns the next node, if any.
    pub(crate) fn next(&self) -> Option<NonNull<Node<T>>> { self.next.load() }

    /// Sets the next node.
    ///
    /// Only the owner of the node may set it.
    pub(crate) fn set_next(&self, next: Option<NonNull<Node<T>>>) { self.next.store(next) }

    /// Sets the payload.
    pub(crate) fn set_payload(&self, payload: NonNull<T>) { self.payload.set(Some(payload)); }

    /// Takes the payload, leaving none.
    pub(crate) fn take_payload(&self) -> Option<NonNull<T>> { self.payload.take() }
}

impl<T> Default for Node<T> {
    fn default() -> Self { Self::new() }
}

// mod tests
