//! Implementation of Linux specific calls.

/// Gives up the processor, moving the current thread to the end of the run queue.
pub(crate) fn yield_now() {
    //  Safety:
    //  -   No pre-condition.
    let result = unsafe { libc::sched_yield() };

    debug_assert_eq!(0, result, "sched_yield always succeeds on Linux");
}
