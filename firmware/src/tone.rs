//! Continuous 900 Hz tone on GPIO3 via PWM + DMA ring.
//!
//! The fill scheduler runs in `idle` and sleeps in `wfe` whenever both ring
//! chunks are ahead of playback. The DMA interrupt only acknowledges the
//! channel and raises the completion flag.
//!
//! Hardware: RP2350 (Pico 2), 12 MHz crystal, system clock 150 MHz.
//!
//! Output:
//! ```text
//!   GPIO3 (PWM1 B) ── 1 kΩ ──┬── speaker / amplifier
//!                         100 nF
//!                            │
//!                           GND
//! ```

#![no_std]
#![no_main]

use defmt_rtt as _;
use panic_probe as _;
use rp235x_hal as hal;

mod ring_output;

/// Boot ROM image definition.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: hal::block::ImageDef = hal::block::ImageDef::secure_exe();

#[rtic::app(device = rp235x_hal::pac, peripherals = true)]
mod app {
    use super::hal;
    use super::ring_output::{DmaIrqAck, PwmRingOutput};

    use pwm_tone::completion::CompletionFlag;
    use pwm_tone::config::ToneConfig;
    use pwm_tone::ring::Ring;
    use pwm_tone::scheduler::FillScheduler;

    const XTAL_FREQ_HZ: u32 = 12_000_000;
    const DMA_CHANNEL: u8 = 0;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        scheduler: FillScheduler<'static, PwmRingOutput>,
        completion: &'static CompletionFlag,
        dma_ack: DmaIrqAck,
    }

    #[init(local = [ring: Ring = Ring::new(), flag: CompletionFlag = CompletionFlag::new()])]
    fn init(cx: init::Context) -> (Shared, Local) {
        let mut pac = cx.device;
        let mut core = cx.core;

        let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);
        let Ok(clocks) = hal::clocks::init_clocks_and_plls(
            XTAL_FREQ_HZ,
            pac.XOSC,
            pac.CLOCKS,
            pac.PLL_SYS,
            pac.PLL_USB,
            &mut pac.RESETS,
            &mut watchdog,
        ) else {
            panic!("clock init failed");
        };
        let sys_clock_hz = hal::Clock::freq(&clocks.system_clock).to_Hz();

        let sio = hal::Sio::new(pac.SIO);
        let pins = hal::gpio::Pins::new(
            pac.IO_BANK0,
            pac.PADS_BANK0,
            sio.gpio_bank0,
            &mut pac.RESETS,
        );

        // ── PWM slice 1, channel B on GPIO3 ─────────────────────────
        let pwm_slices = hal::pwm::Slices::new(pac.PWM, &mut pac.RESETS);
        let mut slice = pwm_slices.pwm1;
        // The pin keeps its PWM function after the typed handle is dropped.
        let _pwm_pin = slice.channel_b.output_to(pins.gpio3);

        // ── Bring DMA out of reset ──────────────────────────────────
        pac.RESETS.reset().modify(|_, w| w.dma().clear_bit());
        while pac.RESETS.reset_done().read().dma().bit_is_clear() {}

        // Pending interrupts wake `wfe` even if masked.
        core.SCB.set_sevonpend();

        // ── Tone configuration ──────────────────────────────────────
        let config = ToneConfig {
            sys_clock_hz,
            ..ToneConfig::rp2350_default()
        }
        .validate()
        .expect("tone config");
        defmt::info!(
            "tone {} Hz at {} Hz sample rate, PWM top {}",
            config.get().tone_hz,
            config.sample_rate(),
            config.get().top
        );

        let ring: &'static Ring = cx.local.ring;
        let completion: &'static CompletionFlag = cx.local.flag;
        defmt::info!("ring at {=usize:#x}", ring.as_ptr() as usize);

        let (output, dma_ack) = PwmRingOutput::new(slice, pac.DMA, DMA_CHANNEL, completion);
        let mut scheduler = FillScheduler::new(ring, config, output);
        scheduler.start();

        (
            Shared {},
            Local {
                scheduler,
                completion,
                dma_ack,
            },
        )
    }

    #[idle(local = [scheduler])]
    fn idle(cx: idle::Context) -> ! {
        cx.local.scheduler.run()
    }

    // ── DMA IRQ0: one per drained chunk ─────────────────────────────

    #[task(binds = DMA_IRQ_0, local = [completion, dma_ack], priority = 1)]
    fn dma_chunk_done(cx: dma_chunk_done::Context) {
        cx.local.dma_ack.acknowledge();
        cx.local.completion.signal();
    }
}
