//! Triangular-PDF dither from a xorshift64* generator.
//!
//! The generator (Marsaglia / Vigna xorshift64*) has a full period of
//! `2^64 - 1` for any nonzero seed, and its most significant output bits are
//! the best distributed. Each dither draw consumes one 64-bit output and uses
//! two disjoint 23-bit slices from the top of it:
//!
//! ```text
//!  63        41 40        18 17         0
//! ┌────────────┬────────────┬────────────┐
//! │  mantissa x │ mantissa y │   unused   │
//! └────────────┴────────────┴────────────┘
//! ```
//!
//! Each slice becomes the mantissa of an `f32` with exponent 0, i.e. a uniform
//! value in `[1.0, 2.0)`. Their difference is triangular on `(-1.0, 1.0)` with
//! zero mean, which decorrelates quantization error from the tone.

use core::num::NonZeroU64;

/// Output multiplier of xorshift64*.
const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

/// Bit pattern of `1.0f32`: sign 0, biased exponent 127, mantissa 0.
const ONE_F32_BITS: u32 = 0x3F80_0000;

/// Mask of the 23 mantissa bits of an `f32`.
const MANTISSA_MASK: u64 = 0x7F_FFFF;

/// Deterministic 64-bit pseudo-random generator. Not cryptographic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xorshift64Star {
    /// Never zero: zero is the generator's only fixed point.
    state: u64,
}

impl Xorshift64Star {
    /// Create a generator from a nonzero seed.
    pub const fn new(seed: NonZeroU64) -> Self {
        Xorshift64Star { state: seed.get() }
    }

    /// Advance the state and return the next 64-bit output.
    #[inline(always)]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(MULTIPLIER)
    }

    /// Next dither value, triangularly distributed on `(-1.0, 1.0)`.
    #[inline(always)]
    pub fn next_triangular(&mut self) -> f32 {
        let bits = self.next_u64();
        let x = uniform_1_2((bits >> 41) & MANTISSA_MASK);
        let y = uniform_1_2((bits >> 18) & MANTISSA_MASK);
        x - y
    }

    /// Raw generator state.
    pub fn state(&self) -> u64 {
        self.state
    }
}

/// Build an `f32` in `[1.0, 2.0)` from 23 mantissa bits.
#[inline(always)]
fn uniform_1_2(mantissa: u64) -> f32 {
    f32::from_bits(ONE_F32_BITS | mantissa as u32)
}
