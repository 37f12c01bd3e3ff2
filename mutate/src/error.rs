//! Errors.

use mutate_core::Exhausted;
use thiserror::Error;

/// Error
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// No node could be allocated to hold the value.
    #[error("lifo exhausted: cannot allocate a node, {allocated} already allocated")]
    Exhausted {
        /// The number of nodes allocated so far.
        allocated: usize,
    },
}

impl From<Exhausted> for Error {
    fn from(error: Exhausted) -> Self { Error::Exhausted { allocated: error.allocated } }
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn error_from_exhausted() {
    let error = Error::from(Exhausted { allocated: 7 });

    assert_eq!(Error::Exhausted { allocated: 7 }, error);
    assert_eq!("lifo exhausted: cannot allocate a node, 7 already allocated", error.to_string());
}

} // mod tests
