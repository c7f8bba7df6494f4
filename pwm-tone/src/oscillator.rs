//! Rotating-phasor sine oscillator.
//!
//! The oscillator state is a unit complex number that is rotated by a fixed
//! per-sample step and then pulled back onto the unit circle:
//!
//! ```text
//! sample   = Re(p)
//! p        = p · advance                 // rotate by 2π·f/fs
//! p        = p · (3 − |p|²) / 2          // one Newton step towards |p| = 1
//! ```
//!
//! The renormalization is a first-order Newton iteration for `1/sqrt(|p|²)`
//! evaluated at `|p|² ≈ 1`, so no square root or division is needed per
//! sample. Its error shrinks quadratically, which keeps single-precision
//! round-off from accumulating over unbounded runs.
//!
//! # Stability assumption
//!
//! The correction converges only while `|p|²` stays inside `(0, 3)`; in
//! practice drift per sample is on the order of `f32::EPSILON`, many orders of
//! magnitude inside that basin. Nothing checks this at runtime.

use core::ops::{Mul, MulAssign};

/// A complex value in single precision.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Phasor {
    pub re: f32,
    pub im: f32,
}

impl Phasor {
    pub const fn new(re: f32, im: f32) -> Self {
        Phasor { re, im }
    }

    /// `e^(i·theta)`.
    pub fn from_angle(theta: f32) -> Self {
        Phasor {
            re: libm::cosf(theta),
            im: libm::sinf(theta),
        }
    }

    #[inline(always)]
    pub fn norm_sqr(self) -> f32 {
        self.re * self.re + self.im * self.im
    }

    /// Argument in `(-π, π]`.
    pub fn arg(self) -> f32 {
        libm::atan2f(self.im, self.re)
    }

    /// Scale towards unit magnitude with one Newton step.
    #[inline(always)]
    pub fn renormalized(self) -> Self {
        let k = (3.0 - self.norm_sqr()) * 0.5;
        Phasor {
            re: self.re * k,
            im: self.im * k,
        }
    }
}

impl Mul for Phasor {
    type Output = Phasor;

    #[inline(always)]
    fn mul(self, rhs: Phasor) -> Phasor {
        Phasor {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl MulAssign for Phasor {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: Phasor) {
        *self = *self * rhs;
    }
}

/// Sine oscillator driven by the phasor recurrence.
///
/// Starts at `-1 + 0i`, so the first sample is the negative peak.
#[derive(Debug, Clone)]
pub struct Oscillator {
    carrier: Phasor,
    advance: Phasor,
}

impl Oscillator {
    /// Create an oscillator at `tone_hz` for a stream running at `sample_rate` Hz.
    pub fn new(tone_hz: f32, sample_rate: f32) -> Self {
        Self::with_phasor(
            Phasor::new(-1.0, 0.0),
            Phasor::from_angle(2.0 * core::f32::consts::PI * tone_hz / sample_rate),
        )
    }

    /// Create an oscillator with an explicit starting phasor and step.
    pub const fn with_phasor(carrier: Phasor, advance: Phasor) -> Self {
        Oscillator { carrier, advance }
    }

    /// Return the real projection of the current phasor, then rotate and
    /// renormalize it for the next call.
    #[inline(always)]
    pub fn next_sample(&mut self) -> f32 {
        let sample = self.carrier.re;
        self.carrier *= self.advance;
        self.carrier = self.carrier.renormalized();
        sample
    }

    /// Current oscillator state.
    pub fn phasor(&self) -> Phasor {
        self.carrier
    }

    /// Per-sample rotation.
    pub fn advance(&self) -> Phasor {
        self.advance
    }

    /// `| |p| - 1 |` for the current state.
    pub fn magnitude_error(&self) -> f32 {
        libm::fabsf(libm::sqrtf(self.carrier.norm_sqr()) - 1.0)
    }
}
