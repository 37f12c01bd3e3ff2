//! The internals of mutate-core.
//!
//! The internals provide all the heavy-lifting.

pub(crate) mod atomic;
pub(crate) mod backoff;
pub(crate) mod mutate;
pub(crate) mod node;
pub(crate) mod ordering;
