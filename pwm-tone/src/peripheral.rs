use crate::constants::{RING_WRAP_BITS, SAMPLES_PER_CHUNK};
use crate::ring::Ring;

/// Width of one DMA transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferSize {
    Byte,
    HalfWord,
    Word,
}

/// Parameters of the self-retriggering ring transfer into the PWM compare
/// register. The destination register is bound by the adapter, which owns the
/// PWM slice and channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingTransfer {
    /// First sample of the ring.
    pub source: *const u16,
    /// Read address wraps on this many low bits.
    pub wrap_bits: u8,
    pub unit: TransferSize,
    /// Transfers between two completion indications (one chunk).
    pub transfers_per_chunk: u32,
    /// Re-trigger after every chunk without CPU involvement.
    pub auto_retrigger: bool,
}

impl RingTransfer {
    /// Continuous half-word transfer of `ring`, one completion per chunk.
    pub fn for_ring(ring: &Ring) -> Self {
        RingTransfer {
            source: ring.as_ptr(),
            wrap_bits: RING_WRAP_BITS,
            unit: TransferSize::HalfWord,
            transfers_per_chunk: SAMPLES_PER_CHUNK as u32,
            auto_retrigger: true,
        }
    }
}

/// Capabilities the fill scheduler needs from the PWM/DMA/interrupt layer.
///
/// Implemented by the firmware for real hardware and by a simulator in tests.
pub trait RingOutput {
    /// Set PWM clock divider and counter wrap. Only valid before arming.
    fn configure_output(&mut self, clock_divisor: u8, wrap: u16);

    /// Start PWM generation; its wrap requests pace the DMA.
    fn arm_output(&mut self);

    /// Whether [`arm_output`](Self::arm_output) has taken effect.
    fn is_output_armed(&self) -> bool;

    /// One-time setup of the ring → compare-register transfer.
    fn configure_ring_transfer(&mut self, transfer: &RingTransfer);

    /// Start the transfer. It stalls on the PWM pacing signal until the
    /// output is armed.
    fn start_ring_transfer(&mut self);

    /// Low-power wait until any asynchronous event is pending. May return
    /// spuriously.
    fn wait_for_pending_event(&mut self);

    /// Whether a chunk completed since the last call. Reading clears it.
    fn poll_and_clear_completion(&mut self) -> bool;
}
