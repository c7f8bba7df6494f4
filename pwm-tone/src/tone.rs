//! Oscillator + dither + quantizer, one chunk at a time.

use crate::config::ValidatedConfig;
use crate::constants::DITHER_SEED;
use crate::dither::Xorshift64Star;
use crate::oscillator::Oscillator;
use crate::quantizer::Quantizer;

/// Produces PWM compare values for the configured tone.
///
/// # Example
/// ```ignore
/// let cfg = ToneConfig::rp2350_default().validate()?;
/// let mut gen = ToneGenerator::new(&cfg);
/// gen.fill(&mut chunk);
/// ```
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    oscillator: Oscillator,
    dither: Xorshift64Star,
    dither_scale: f32,
    quantizer: Quantizer,
}

impl ToneGenerator {
    pub fn new(config: &ValidatedConfig) -> Self {
        let cfg = config.get();
        Self::from_parts(
            Oscillator::new(cfg.tone_hz, config.sample_rate()),
            Xorshift64Star::new(DITHER_SEED),
            cfg.dither_scale,
            Quantizer::new(cfg.top, cfg.amplitude),
        )
    }

    pub fn from_parts(
        oscillator: Oscillator,
        dither: Xorshift64Star,
        dither_scale: f32,
        quantizer: Quantizer,
    ) -> Self {
        ToneGenerator {
            oscillator,
            dither,
            dither_scale,
            quantizer,
        }
    }

    /// Next compare value.
    #[inline(always)]
    pub fn next_duty(&mut self) -> u16 {
        let sample = self.oscillator.next_sample();
        // A zero level never touches the generator, so an undithered stream
        // does not depend on the seed.
        let dither = if self.dither_scale == 0.0 {
            0.0
        } else {
            self.dither_scale * self.dither.next_triangular()
        };
        self.quantizer.quantize(sample, dither)
    }

    /// Overwrite every slot of `chunk` with consecutive samples.
    pub fn fill(&mut self, chunk: &mut [u16]) {
        for slot in chunk.iter_mut() {
            *slot = self.next_duty();
        }
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }
}
