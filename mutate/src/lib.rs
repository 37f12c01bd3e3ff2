#![deny(missing_docs)]

//! Lock-free atomic transformations, and a lock-free stack built upon them.
//!
//! This crate is the ready-to-use face of `mutate-core`:
//!
//! -   `AtomicCell` and `TaggedPtr` are re-exported as is, and require no platform.
//! -   `Lifo` is bound to the standard allocator, and reports exhaustion as an `Error`.
//!
//! #   Example
//!
//! ```
//! use mutate::{AtomicCell, Lifo};
//!
//! let counter = AtomicCell::new(127i32);
//!
//! while !counter.mutate(|value| Some((value + 1) % 128)) {}
//!
//! assert_eq!(0, counter.get());
//!
//! let (a, b) = (String::from("a"), String::from("b"));
//! let lifo = Lifo::new();
//!
//! lifo.push(&a).unwrap();
//! lifo.push(&b).unwrap();
//!
//! assert_eq!(Some(&b), lifo.pop());
//! assert_eq!(Some(&a), lifo.pop());
//! assert_eq!(None, lifo.pop());
//! ```

mod error;
mod lifo;
mod platform;

pub use mutate_core::{AtomicCell, Backend, BACKEND, Census, Configuration, Platform, Scalar, TaggedPtr};

pub use error::Error;
pub use lifo::Lifo;
pub use platform::{StdConfiguration, StdPlatform};
