//! RP2350 adapter: PWM slice + one DMA channel behind [`RingOutput`].
//!
//! ```text
//!  Ring (4 KiB, aligned)      DMA ch0 (TREQ = PWM1 wrap)         PWM slice 1
//! ┌───────────┬───────────┐  read incr, ring wrap 12 bits   ┌──────────────┐
//! │  chunk 0  │  chunk 1  │ ───── 16-bit, write fixed ─────►│ CC.B (GPIO3) │
//! └───────────┴───────────┘  TRANS_COUNT = 1024, TRIGGER_SELF└──────────────┘
//!                                 │ IRQ0 once per 1024 transfers
//!                                 ▼
//!                          DMA_IRQ_0 → CompletionFlag::signal
//! ```

use pwm_tone::completion::CompletionFlag;
use pwm_tone::peripheral::{RingOutput, RingTransfer, TransferSize};
use rp235x_hal::pac;
use rp235x_hal::pwm::{FreeRunning, Pwm1, Slice, SliceId};

/// PWM slice carrying the tone; its channel B is routed to GPIO3.
pub type ToneSlice = Slice<Pwm1, FreeRunning>;

/// Write-1-to-clear access to one DMA channel's IRQ0 status, for the ISR.
pub struct DmaIrqAck {
    mask: u32,
}

impl DmaIrqAck {
    /// Clear the channel's pending IRQ0 bit.
    #[inline]
    pub fn acknowledge(&mut self) {
        // SAFETY: INTS0 is write-1-to-clear; writing only this channel's bit
        // cannot disturb other channels or the scheduler's registers.
        let dma = unsafe { &*pac::DMA::ptr() };
        dma.ints0().write(|w| unsafe { w.bits(self.mask) });
    }
}

/// [`RingOutput`] over PWM channel B fed by a self-retriggering DMA channel.
pub struct PwmRingOutput {
    slice: ToneSlice,
    armed: bool,
    dma: pac::DMA,
    dma_channel: u8,
    completion: &'static CompletionFlag,
}

impl PwmRingOutput {
    /// `dma` must already be out of reset; `slice` is reset by `Slices::new`.
    pub fn new(
        slice: ToneSlice,
        dma: pac::DMA,
        dma_channel: u8,
        completion: &'static CompletionFlag,
    ) -> (Self, DmaIrqAck) {
        let output = PwmRingOutput {
            slice,
            armed: false,
            dma,
            dma_channel,
            completion,
        };
        let ack = DmaIrqAck {
            mask: output.channel_mask(),
        };
        (output, ack)
    }

    fn channel_mask(&self) -> u32 {
        1 << self.dma_channel
    }

    /// Address of channel B's half (bits 31:16) of the slice's `CC` register.
    fn compare_register(&self) -> u32 {
        // SAFETY: only the address is taken; the slice owns the register.
        let pwm = unsafe { &*pac::PWM::ptr() };
        let cc = pwm.ch(<Pwm1 as SliceId>::DYN.num as usize).cc().as_ptr() as u32;
        cc + 2
    }
}

impl RingOutput for PwmRingOutput {
    fn configure_output(&mut self, clock_divisor: u8, wrap: u16) {
        debug_assert!(!self.armed);
        self.slice.disable();
        self.slice.default_config();
        self.slice.set_div_int(clock_divisor);
        self.slice.set_div_frac(0);
        self.slice.set_top(wrap);
        self.slice.set_counter(0);
    }

    fn arm_output(&mut self) {
        cortex_m::asm::dsb();
        self.slice.enable();
        self.armed = true;
    }

    fn is_output_armed(&self) -> bool {
        self.armed
    }

    fn configure_ring_transfer(&mut self, transfer: &RingTransfer) {
        let write_addr = self.compare_register();
        let channel = self.dma_channel;
        let ch = self.dma.ch(channel as usize);

        ch.ch_read_addr()
            .write(|w| unsafe { w.bits(transfer.source as u32) });
        ch.ch_write_addr().write(|w| unsafe { w.bits(write_addr) });
        ch.ch_trans_count().write(|w| {
            let w = unsafe { w.count().bits(transfer.transfers_per_chunk) };
            if transfer.auto_retrigger {
                w.mode().trigger_self()
            } else {
                w.mode().normal()
            }
        });
        // EN stays clear: a trigger on a disabled channel is ignored, so
        // writing CTRL_TRIG here does not start anything.
        ch.ch_ctrl_trig().write(|w| {
            let w = match transfer.unit {
                TransferSize::Byte => w.data_size().size_byte(),
                TransferSize::HalfWord => w.data_size().size_halfword(),
                TransferSize::Word => w.data_size().size_word(),
            };
            unsafe {
                w.en()
                    .clear_bit()
                    .incr_read()
                    .set_bit()
                    .incr_write()
                    .clear_bit()
                    .ring_sel()
                    .clear_bit()
                    .ring_size()
                    .bits(transfer.wrap_bits)
                    // chaining to itself disables chaining
                    .chain_to()
                    .bits(channel)
                    .treq_sel()
                    .bits(<Pwm1 as SliceId>::WRAP_DREQ)
            }
        });

        // Raise IRQ0 per chunk; the NVIC line is owned by the RTIC task.
        let mask = self.channel_mask();
        self.dma.ints0().write(|w| unsafe { w.bits(mask) });
        self.dma
            .inte0()
            .modify(|r, w| unsafe { w.bits(r.bits() | mask) });
        cortex_m::asm::dsb();
    }

    fn start_ring_transfer(&mut self) {
        // Setting EN through the trigger alias starts the channel. It then
        // stalls on the PWM wrap request until the slice is enabled.
        self.dma
            .ch(self.dma_channel as usize)
            .ch_ctrl_trig()
            .modify(|_, w| w.en().set_bit());
    }

    fn wait_for_pending_event(&mut self) {
        cortex_m::asm::dsb();
        cortex_m::asm::wfe();
    }

    fn poll_and_clear_completion(&mut self) -> bool {
        self.completion.take()
    }
}
