//! Backend
//!
//! The atomic transformation can be realized by one of two hardware mechanisms. The selection is made at compile-time,
//! depending on the target architecture, and both backends honour the exact same contract.

/// The hardware mechanism used to commit atomic transformations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Backend {
    /// A weak Compare-And-Swap from the observed value to the transformed value.
    ///
    /// Pointers are paired with a tag in a double-word, to detect ABA.
    CompareAndSwap,
    /// A Load-Link, followed by a Store-Conditional of the transformed value.
    ///
    /// The exclusive reservation detects any interleaved store, hence pointers need no tag.
    LoadLinkStoreConditional,
}

impl Backend {
    /// Returns whether `TaggedPtr` pairs its pointer with a tag on this backend.
    pub const fn is_tagged(&self) -> bool {
        match self {
            Backend::CompareAndSwap => true,
            Backend::LoadLinkStoreConditional => false,
        }
    }
}

/// The backend selected for the current target.
///
/// Load-Link/Store-Conditional is used on aarch64, unless the `force-cas` feature is enabled.
pub const BACKEND: Backend = crate::internals::mutate::BACKEND;

// mod tests
