//! Chunk-completion flag shared between the DMA interrupt and the scheduler.
//!
//! The interrupt handler only sets the flag; all logic stays in the fill
//! scheduler, which reads and clears it through
//! [`RingOutput::poll_and_clear_completion`](crate::peripheral::RingOutput::poll_and_clear_completion).
//!
//! # Contract
//!
//! - Only the completion context calls [`signal()`](CompletionFlag::signal).
//! - Only the scheduler calls [`take()`](CompletionFlag::take).
//!
//! Like the hardware interrupt bit it mirrors, the flag does not count: two
//! completions raised before one `take()` read as one.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct CompletionFlag {
    pending: AtomicBool,
}

impl CompletionFlag {
    pub const fn new() -> Self {
        CompletionFlag {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark one chunk as drained. Called from the DMA interrupt.
    #[inline]
    pub fn signal(&self) {
        // Release: the interrupt acknowledgement happens before the scheduler
        // can observe the flag.
        self.pending.store(true, Ordering::Release);
    }

    /// Read and clear in one atomic step.
    #[inline]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl Default for CompletionFlag {
    fn default() -> Self {
        Self::new()
    }
}
