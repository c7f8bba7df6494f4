//! # pwm-tone
//!
//! A `no_std`, allocation-free tone streamer: a single sine tone is
//! synthesized on the CPU and played through a PWM compare register by a DMA
//! channel that replays a two-chunk ring forever, re-triggering itself
//! without CPU help.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Signal | [`oscillator`] | Self-renormalizing rotating phasor |
//! | Signal | [`dither`] | xorshift64* → triangular dither |
//! | Signal | [`quantizer`] / [`tone`] | Dithered mapping onto the PWM duty range |
//! | Memory | [`ring`] | Size-aligned two-chunk DMA ring |
//! | Control | [`scheduler`] | Fill/drain handshake and arm-once state machine |
//! | Seams | [`peripheral`] / [`completion`] | Hardware capability trait, ISR flag |
//! | Setup | [`config`] / [`constants`] | Startup parameters and their validation |
//!
//! ## Data flow
//!
//! ```text
//! FillScheduler ─► ToneGenerator ─► chunk FillCount % 2 ─► Ring
//!       ▲                                                    │ DMA (wrapping,
//!       │                                                    ▼  self-retriggering)
//!       └──── completion (one per chunk) ◄──────────── PWM compare register
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use pwm_tone::config::ToneConfig;
//! use pwm_tone::scheduler::FillScheduler;
//!
//! let config = ToneConfig::rp2350_default().validate().expect("tone config");
//! let mut scheduler = FillScheduler::new(ring, config, output);
//! scheduler.run();
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `defmt` | no | `defmt::Format` on public types, arm-time log line |

#![no_std]

#[cfg(test)]
extern crate std;

pub mod constants;
pub mod config;
pub mod dither;
pub mod oscillator;
pub mod quantizer;
pub mod tone;
pub mod ring;
pub mod completion;
pub mod peripheral;
pub mod scheduler;
