//! Lifo, bound to the standard platform.

use std::fmt;

use tracing::{debug, warn};

use mutate_core::{Configuration, Platform};

use crate::{Census, Error, StdConfiguration, StdPlatform};

/// A lock-free stack of references to `T`, borrowed for `'a`.
///
/// Popped nodes are kept on an internal free list for re-use, and only released when the stack is dropped, hence the
/// memory footprint of the stack is that of its peak size.
///
/// The configuration `C` and platform `P` default to `StdConfiguration` and `StdPlatform`.
///
/// #   Example
///
/// ```
/// use mutate::Lifo;
///
/// let values = [1, 2, 3];
/// let mut lifo = Lifo::new();
///
/// for value in &values {
///     lifo.push(value).unwrap();
/// }
///
/// assert_eq!(Some(&3), lifo.pop());
///
/// let census = lifo.census();
///
/// assert_eq!((2, 1, 3), (census.active, census.free, census.allocated));
/// ```
///
/// A stack of long-lived references never accepts a shorter-lived one:
///
/// ```compile_fail
/// use mutate::Lifo;
///
/// fn shorten<'s>(lifo: &'s Lifo<'static, Vec<u8>>) -> &'s Lifo<'s, Vec<u8>> { lifo }
///
/// let lifo = Lifo::<'static, Vec<u8>>::new();
///
/// {
///     let short = vec![0xAA; 64];
///     shorten(&lifo).push(&short).unwrap();
/// }
///
/// let dangling: &'static Vec<u8> = lifo.pop().unwrap();
/// ```
pub struct Lifo<'a, T, C = StdConfiguration, P = StdPlatform>(mutate_core::Lifo<'a, T, C, P>)
    where
        P: Platform;

impl<'a, T> Lifo<'a, T> {
    /// Creates an empty instance.
    pub fn new() -> Self { Self::with_platform(StdPlatform::new()) }
}

impl<'a, T, C, P> Lifo<'a, T, C, P>
    where
        P: Platform,
{
    /// Creates an empty instance, allocating through `platform`.
    pub fn with_platform(platform: P) -> Self { Self(mutate_core::Lifo::new(platform)) }

    /// Returns whether the stack is empty.
    ///
    /// Concurrent modifications may render the result stale.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Returns the number of nodes allocated so far.
    pub fn allocated(&self) -> usize { self.0.allocated() }

    /// Returns the distribution of the nodes between the active list and the free list.
    pub fn census(&mut self) -> Census { self.0.census() }
}

impl<'a, T, C, P> Lifo<'a, T, C, P>
    where
        C: Configuration,
        P: Platform,
{
    /// Pushes `value` on top of the stack.
    ///
    /// #   Errors
    ///
    /// Returns `Error::Exhausted` if no node could be allocated, in which case the stack is unmodified.
    pub fn push(&self, value: &'a T) -> Result<(), Error> {
        self.0.push(value).map_err(|error| {
            warn!(allocated = error.allocated, "failed to push: {}", error);
            error.into()
        })
    }

    /// Pops the reference on top of the stack, if any.
    pub fn pop(&self) -> Option<&'a T> { self.0.pop() }
}

impl<'a, T> Default for Lifo<'a, T> {
    fn default() -> Self { Self::new() }
}

impl<'a, T, C, P> fmt::Debug for Lifo<'a, T, C, P>
    where
        P: Platform,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(&self.0, f) }
}

impl<'a, T, C, P> Drop for Lifo<'a, T, C, P>
    where
        P: Platform,
{
    fn drop(&mut self) {
        let census = self.0.census();

        debug!(active = census.active, free = census.free, allocated = census.allocated, "dropping lifo");

        debug_assert!(census.is_conserved(), "{:?}", census);
    }
}

#[cfg(test)]
mod tests {

use std::{io, sync::{Arc, Mutex}};

use super::*;

//  A configuration allowing a single node.
struct SingleNode;

impl Configuration for SingleNode {
    const SPIN_LIMIT: u32 = 0;
    const MAXIMUM_NODES: usize = 1;
}

//  Captures the output of a subscriber.
#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    fn contents(&self) -> String { String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned() }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

#[test]
fn lifo_round_trip() {
    let (a, b) = (String::from("a"), String::from("b"));
    let lifo = Lifo::default();

    assert!(lifo.is_empty());

    lifo.push(&a).unwrap();
    lifo.push(&b).unwrap();

    assert_eq!(2, lifo.allocated());

    assert_eq!(Some(&b), lifo.pop());
    assert_eq!(Some(&a), lifo.pop());
    assert_eq!(None, lifo.pop());

    assert!(lifo.is_empty());
}

#[test]
fn lifo_debug() {
    let value = 1;
    let lifo = Lifo::new();

    lifo.push(&value).unwrap();

    let debug = format!("{:?}", lifo);

    assert!(debug.starts_with("Lifo {"), "{}", debug);
    assert!(debug.contains("allocated: 1"), "{}", debug);
}

#[test]
fn lifo_push_exhausted_warns() {
    let buffer = Buffer::default();

    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let buffer = buffer.clone();
            move || buffer.clone()
        })
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();

    let values = [1, 2];

    tracing::subscriber::with_default(subscriber, || {
        let lifo: Lifo<'_, i32, SingleNode> = Lifo::with_platform(StdPlatform::new());

        lifo.push(&values[0]).unwrap();

        assert_eq!(Err(Error::Exhausted { allocated: 1 }), lifo.push(&values[1]));

        //  The stack is left untouched, and its node remains available.
        assert_eq!(Some(&values[0]), lifo.pop());

        lifo.push(&values[1]).unwrap();

        assert_eq!(Some(&values[1]), lifo.pop());
        assert_eq!(1, lifo.allocated());
    });

    let logs = buffer.contents();

    assert!(logs.contains("WARN"), "{}", logs);
    assert!(logs.contains("failed to push: cannot allocate a node, 1 already allocated"), "{}", logs);
    assert!(logs.contains("allocated=1"), "{}", logs);
}

} // mod tests
