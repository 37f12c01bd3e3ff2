//! The API of mutate-core.

mod backend;
mod cell;
mod configuration;
mod lifo;
mod platform;
mod tagged_ptr;

pub use backend::{Backend, BACKEND};
pub use cell::{AtomicCell, Scalar};
pub use configuration::Configuration;
pub use lifo::{Census, Exhausted, Lifo};
pub use platform::Platform;
pub use tagged_ptr::TaggedPtr;
