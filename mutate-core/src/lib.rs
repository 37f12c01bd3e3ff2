#![no_std]

#![deny(missing_docs)]

//! Building blocks for lock-free atomic transformations.
//!
//! mutate-core is a set of building blocks to apply arbitrary transformations to shared atomic values. It contains:
//! -   An atomic cell, `AtomicCell`, whose value is transformed by a caller-supplied function, and only committed if
//!     no other thread interleaved.
//! -   A tagged pointer, `TaggedPtr`, applying the same transformations to pointers whilst guarding against ABA.
//! -   A lock-free stack, `Lifo`, recycling its nodes through a free-list rather than returning them to the platform.
//! -   A platform trait, used to allocate the nodes of the stack, and back off under contention.
//!
//! The atomic transformation is implemented either with Compare-And-Swap, or with Load-Link/Store-Conditional on
//! architectures exposing them natively; see `BACKEND`.

#[cfg(test)]
#[macro_use]
extern crate std;

mod api;
mod internals;

pub use api::*;
