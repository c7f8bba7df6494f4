use core::num::NonZeroU64;

/// Bytes in one ring chunk.
pub const BYTES_PER_CHUNK: usize = 2048;

/// Number of 16-bit duty-cycle samples per chunk.
pub const SAMPLES_PER_CHUNK: usize = BYTES_PER_CHUNK / core::mem::size_of::<u16>();

/// Number of chunks in the ring. The fill/drain handshake assumes exactly two.
pub const CHUNKS_PER_RING: usize = 2;

/// Total ring size in bytes.
pub const RING_BYTES: usize = BYTES_PER_CHUNK * CHUNKS_PER_RING;

/// DMA read-address wrap width: `1 << RING_WRAP_BITS == RING_BYTES`.
pub const RING_WRAP_BITS: u8 = 12;

const _: () = assert!(RING_BYTES.is_power_of_two(), "ring size must be a power of two");
const _: () = assert!(1usize << RING_WRAP_BITS == RING_BYTES, "wrap bits do not cover the ring");

/// Chunks between two stream statistics log lines (about 5.6 s at 46 875 Hz).
pub const STATS_LOG_INTERVAL_CHUNKS: u32 = 256;

/// Fixed seed for the dither generator.
pub const DITHER_SEED: NonZeroU64 = match NonZeroU64::new(1) {
    Some(seed) => seed,
    None => panic!("dither seed must be nonzero"),
};

/// System clock the RP2350 runs at after default PLL bring-up.
pub const DEFAULT_SYS_CLOCK_HZ: u32 = 150_000_000;

/// PWM counter wrap value. `150 MHz / (3199 + 1) = 46 875 Hz` output rate.
pub const DEFAULT_PWM_TOP: u16 = 3199;

/// Tone frequency in Hz. Any value between DC and Nyquist is allowed.
pub const DEFAULT_TONE_HZ: f32 = 900.0;
