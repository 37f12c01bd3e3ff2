//! The configuration of mutate-core.
//!
//! A single Configuration instance should be shared between all `Lifo` of an application, though nothing prevents
//! mixing them.
//!
//! The Configuration governs two aspects of the `Lifo`:
//!
//! -   Backoff: how long a thread spins after a failed attempt, before yielding to the `Platform`.
//! -   Growth: how many nodes a single `Lifo` may ever allocate.

/// Configuration
///
/// The Configuration instance allows adjusting the backoff and growth of a `Lifo`.
pub trait Configuration {
    /// The number of spinning rounds before the backoff starts yielding the processor.
    ///
    /// Round `i` spins for `2^i` iterations, hence this value should remain small; anything above 10 is unlikely to be
    /// productive.
    const SPIN_LIMIT: u32;

    /// The maximum number of nodes a single `Lifo` allocates over its lifetime.
    ///
    /// A `push` requiring a new node past this limit fails, just as if the `Platform` failed to allocate it.
    const MAXIMUM_NODES: usize;
}
