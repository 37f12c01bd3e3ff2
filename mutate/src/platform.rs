//! Abstraction over OS differences.

use std::{alloc::{self, Layout}, ptr::NonNull};

use mutate_core::{Configuration, Platform};
use tracing::trace;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
use linux::yield_now;

#[cfg(not(target_os = "linux"))]
use std::thread::yield_now;

/// The default configuration.
///
/// Spins up to 6 rounds, that is 63 spin-loop hints, before yielding, and allocates as many nodes as necessary.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdConfiguration;

impl Configuration for StdConfiguration {
    const SPIN_LIMIT: u32 = 6;
    const MAXIMUM_NODES: usize = usize::MAX;
}

/// The default platform, backed by the global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdPlatform;

impl StdPlatform {
    /// Creates an instance.
    pub const fn new() -> Self { Self }
}

impl Platform for StdPlatform {
    unsafe fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);

        let pointer = NonNull::new(alloc::alloc(layout));

        trace!(size = layout.size(), align = layout.align(), success = pointer.is_some(), "allocating node");

        pointer
    }

    unsafe fn deallocate(&self, pointer: NonNull<u8>, layout: Layout) {
        alloc::dealloc(pointer.as_ptr(), layout);
    }

    fn yield_now(&self) { yield_now() }
}

// mod tests
