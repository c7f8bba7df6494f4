//! Two-chunk sample ring shared with the DMA engine.
//!
//! ```text
//!  RING_BYTES-aligned                                   wrap (ring_size = 12)
//! ┌──────────────────────────┬──────────────────────────┐ ↺
//! │ chunk 0: [u16; 1024]     │ chunk 1: [u16; 1024]     │
//! └──────────────────────────┴──────────────────────────┘
//!   ▲ CPU writes chunk  FillCount % 2      ▲ DMA reads the other one
//! ```
//!
//! The DMA read address wraps by masking its low [`RING_WRAP_BITS`] bits, so
//! the ring must be exactly `1 << RING_WRAP_BITS` bytes and aligned to that
//! size. Both are checked at compile time.
//!
//! The ring itself does no synchronization. Which chunk the CPU may write is
//! decided by the fill/drain handshake in [`crate::scheduler`]; the DMA engine
//! reads through a raw address and never forms a Rust reference.

use core::cell::UnsafeCell;

use crate::constants::{CHUNKS_PER_RING, RING_BYTES, RING_WRAP_BITS, SAMPLES_PER_CHUNK};

/// One block of PWM compare values.
pub type Chunk = [u16; SAMPLES_PER_CHUNK];

/// Ring storage. `align(4096)` must match [`RING_BYTES`].
#[repr(C, align(4096))]
pub struct Ring {
    chunks: UnsafeCell<[Chunk; CHUNKS_PER_RING]>,
}

const _: () = assert!(core::mem::size_of::<Ring>() == RING_BYTES);
const _: () = assert!(core::mem::align_of::<Ring>() == RING_BYTES);
const _: () = assert!(1usize << RING_WRAP_BITS == core::mem::size_of::<Ring>());

// SAFETY: The ring is written by exactly one context (the fill scheduler) and
// read by hardware. Exclusive access to a chunk is granted only through the
// unsafe `chunk_mut`, whose caller upholds the fill/drain handshake.
unsafe impl Sync for Ring {}

impl Ring {
    /// Zero-filled ring, usable in `static` and RTIC local initializers.
    pub const fn new() -> Self {
        Ring {
            chunks: UnsafeCell::new([[0u16; SAMPLES_PER_CHUNK]; CHUNKS_PER_RING]),
        }
    }

    /// Address of the first sample, for the DMA read pointer.
    pub fn as_ptr(&self) -> *const u16 {
        self.chunks.get() as *const u16
    }

    /// Exclusive view of chunk `index`.
    ///
    /// # Safety
    ///
    /// No other reference to this chunk may be live, and the DMA engine must
    /// not be reading it (the previous drain of this chunk has been
    /// acknowledged, or the output is not yet armed).
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn chunk_mut(&self, index: usize) -> &mut Chunk {
        debug_assert!(index < CHUNKS_PER_RING);
        // SAFETY: In bounds; exclusivity is the caller's contract.
        unsafe { &mut (*self.chunks.get())[index] }
    }

    /// Volatile read of one sample by absolute ring position, wrapping the
    /// same way the DMA read address does.
    pub fn read_wrapped(&self, position: usize) -> u16 {
        let offset = position % (SAMPLES_PER_CHUNK * CHUNKS_PER_RING);
        // SAFETY: `offset` is within the ring; a volatile read of a `u16`
        // never forms a reference that could alias a writer's `&mut`.
        unsafe { self.as_ptr().add(offset).read_volatile() }
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}
