//! Blocking-context capability
//!
//! Flash erase and program calls stall the CPU for milliseconds, and file
//! writes go through a slow removable medium. Settings writes therefore take
//! a [`BlockingContext`] token. Thread-mode code creates one explicitly;
//! interrupt handlers and control-loop tasks are never handed one, so a
//! write from those contexts does not type-check.

/// Proof that the caller may block on storage
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockingContext {
    _private: (),
}

impl BlockingContext {
    /// Claim the right to block
    ///
    /// Call only from thread mode (main loop, console command handler,
    /// boot code), never from an interrupt or a time-critical task.
    pub fn thread_mode() -> Self {
        Self { _private: () }
    }
}
