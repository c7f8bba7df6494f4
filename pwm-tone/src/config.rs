//! Startup configuration and its one-time validation.
//!
//! Everything the streaming loop relies on but never re-checks is verified
//! here once, before the first sample is generated. A failed validation is a
//! build/configuration defect; firmware treats it as fatal.

use core::fmt;

use crate::constants::{DEFAULT_PWM_TOP, DEFAULT_SYS_CLOCK_HZ, DEFAULT_TONE_HZ};

/// Tone and output-timing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToneConfig {
    /// Clock feeding the PWM slice, in Hz.
    pub sys_clock_hz: u32,
    /// Integer PWM clock divider (1–255).
    pub clock_divisor: u8,
    /// PWM counter wrap value. The counter runs `0..=top`, so one output
    /// sample lasts `top + 1` ticks.
    pub top: u16,
    /// Tone frequency in Hz, `0 <= tone_hz < sample_rate / 2`.
    pub tone_hz: f32,
    /// Output level relative to full scale, `0.0..=1.0`.
    pub amplitude: f32,
    /// Dither level in LSBs, `0.0..=1.0`. Zero disables dither.
    pub dither_scale: f32,
}

impl ToneConfig {
    /// 900 Hz full-scale tone at 46 875 Hz on a 150 MHz RP2350, dithered.
    pub const fn rp2350_default() -> Self {
        ToneConfig {
            sys_clock_hz: DEFAULT_SYS_CLOCK_HZ,
            clock_divisor: 1,
            top: DEFAULT_PWM_TOP,
            tone_hz: DEFAULT_TONE_HZ,
            amplitude: 1.0,
            dither_scale: 1.0,
        }
    }

    /// Output sample rate in Hz: one sample per PWM wrap.
    pub fn sample_rate(&self) -> f32 {
        self.sys_clock_hz as f32 / (self.clock_divisor as f32 * (self.top as f32 + 1.0))
    }

    /// Check every startup precondition.
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.clock_divisor == 0 {
            return Err(ConfigError::ZeroClockDivisor);
        }
        // Largest quantizer output is top + 0.5 + dither_scale, truncated.
        if self.top > u16::MAX - 2 {
            return Err(ConfigError::WrapTooLarge { top: self.top });
        }
        let nyquist = self.sample_rate() * 0.5;
        if !(self.tone_hz >= 0.0 && self.tone_hz < nyquist) {
            return Err(ConfigError::ToneAboveNyquist {
                tone_hz: self.tone_hz,
                nyquist_hz: nyquist,
            });
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(ConfigError::AmplitudeOutOfRange(self.amplitude));
        }
        if !(0.0..=1.0).contains(&self.dither_scale) {
            return Err(ConfigError::DitherOutOfRange(self.dither_scale));
        }
        Ok(ValidatedConfig(self))
    }
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self::rp2350_default()
    }
}

/// A [`ToneConfig`] that has passed [`ToneConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValidatedConfig(ToneConfig);

impl ValidatedConfig {
    pub fn get(&self) -> &ToneConfig {
        &self.0
    }

    pub fn sample_rate(&self) -> f32 {
        self.0.sample_rate()
    }
}

/// A violated startup precondition.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// PWM clock divider of zero.
    ZeroClockDivisor,
    /// Quantized samples could overflow the 16-bit compare register.
    WrapTooLarge { top: u16 },
    /// Tone frequency negative, NaN, or at/above half the sample rate.
    ToneAboveNyquist { tone_hz: f32, nyquist_hz: f32 },
    /// Amplitude outside `0.0..=1.0`.
    AmplitudeOutOfRange(f32),
    /// Dither level outside `0.0..=1.0`.
    DitherOutOfRange(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroClockDivisor => write!(f, "PWM clock divisor must be nonzero"),
            ConfigError::WrapTooLarge { top } => {
                write!(f, "PWM wrap {} leaves no headroom for dither", top)
            }
            ConfigError::ToneAboveNyquist { tone_hz, nyquist_hz } => write!(
                f,
                "tone {} Hz outside 0..{} Hz",
                tone_hz, nyquist_hz
            ),
            ConfigError::AmplitudeOutOfRange(a) => write!(f, "amplitude {} outside 0..=1", a),
            ConfigError::DitherOutOfRange(d) => write!(f, "dither level {} outside 0..=1", d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_runs_at_46875_hz() {
        let cfg = ToneConfig::rp2350_default().validate().unwrap();
        assert_eq!(cfg.sample_rate(), 46_875.0);
        assert_eq!(cfg.get().tone_hz, 900.0);
    }

    #[test]
    fn sample_rate_counts_top_plus_one_ticks() {
        let cfg = ToneConfig {
            sys_clock_hz: 48_000_000,
            clock_divisor: 2,
            top: 999,
            ..ToneConfig::default()
        };
        assert_eq!(cfg.sample_rate(), 24_000.0);
    }

    #[test]
    fn rejects_zero_divisor() {
        let cfg = ToneConfig {
            clock_divisor: 0,
            ..ToneConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroClockDivisor));
    }

    #[test]
    fn rejects_wrap_without_headroom() {
        let cfg = ToneConfig {
            top: u16::MAX,
            sys_clock_hz: 150_000_000,
            ..ToneConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::WrapTooLarge { top: u16::MAX }));

        let ok = ToneConfig {
            top: u16::MAX - 2,
            tone_hz: 100.0,
            ..ToneConfig::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn rejects_tone_at_or_above_nyquist() {
        let cfg = ToneConfig {
            tone_hz: 23_437.5,
            ..ToneConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ToneAboveNyquist { .. })));

        let nan = ToneConfig {
            tone_hz: f32::NAN,
            ..ToneConfig::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::ToneAboveNyquist { .. })));
    }

    #[test]
    fn dc_tone_is_allowed() {
        let cfg = ToneConfig {
            tone_hz: 0.0,
            ..ToneConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_amplitude_and_dither_out_of_range() {
        let loud = ToneConfig {
            amplitude: 1.5,
            ..ToneConfig::default()
        };
        assert_eq!(loud.validate(), Err(ConfigError::AmplitudeOutOfRange(1.5)));

        let noisy = ToneConfig {
            dither_scale: -0.1,
            ..ToneConfig::default()
        };
        assert_eq!(noisy.validate(), Err(ConfigError::DitherOutOfRange(-0.1)));
    }

    #[test]
    fn display_names_the_problem() {
        use std::string::ToString;
        assert_eq!(
            ConfigError::ZeroClockDivisor.to_string(),
            "PWM clock divisor must be nonzero"
        );
        assert_eq!(
            ConfigError::AmplitudeOutOfRange(2.0).to_string(),
            "amplitude 2 outside 0..=1"
        );
    }
}
