//! Test helpers shared across the crates of the workspace.

#![deny(missing_docs)]

mod bursty;

pub use bursty::{Bursty, BurstyBuilder};
