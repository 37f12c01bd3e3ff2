//! Backoff of the retry loops.

use core::{hint, marker::PhantomData};

use crate::{Configuration, Platform};

/// Backoff
///
/// Spins for exponentially longer rounds after each failed attempt, up to `C::SPIN_LIMIT` rounds, then yields the
/// processor through the platform on every subsequent attempt.
pub(crate) struct Backoff<'a, C, P> {
    platform: &'a P,
    step: u32,
    _configuration: PhantomData<C>,
}

impl<'a, C, P> Backoff<'a, C, P>
    where
        C: Configuration,
        P: Platform,
{
    /// Creates an instance.
    pub(crate) fn new(platform: &'a P) -> Self { Self { platform, step: 0, _configuration: PhantomData } }

    /// Backs off, after a failed attempt.
    pub(crate) fn snooze(&mut self) {
        if self.step < C::SPIN_LIMIT {
            let spins = 1u32.checked_shl(self.step).unwrap_or(u32::MAX);

            for _ in 0..spins {
                hint::spin_loop();
            }

            self.step += 1;
        } else {
            self.platform.yield_now();
        }
    }

    /// Returns whether the backoff is yielding, rather than spinning.
    #[cfg(test)]
    pub(crate) fn is_yielding(&self) -> bool { self.step >= C::SPIN_LIMIT }
}

// mod tests
