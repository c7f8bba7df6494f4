//! Bipolar sample → PWM compare value.
//!
//! ```text
//! duty = trunc( (0.5 + 0.5 · amplitude · sample) · top + 0.5 + dither )
//! ```
//!
//! The `+ 0.5` turns truncation into round-to-nearest when dither is zero.
//! Nothing is clamped: with `|sample| <= 1`, `amplitude <= 1` and
//! `|dither| < 1` the result lies in `0..=top + 1`, and `top + 1` is a valid
//! compare value (output high for the whole period). Negative intermediate
//! values truncate to zero. Callers that use larger dither levels must add
//! their own saturation; [`crate::config::ToneConfig::validate`] rejects
//! configurations where that could happen.

/// Maps samples in `[-1, 1]` onto `0..=top`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    top: f32,
    amplitude: f32,
}

impl Quantizer {
    pub fn new(top: u16, amplitude: f32) -> Self {
        Quantizer {
            top: top as f32,
            amplitude,
        }
    }

    /// Quantize one sample. `dither` is added before truncation.
    #[inline(always)]
    pub fn quantize(&self, sample: f32, dither: f32) -> u16 {
        ((0.5 + 0.5 * sample * self.amplitude) * self.top + 0.5 + dither) as u16
    }
}
