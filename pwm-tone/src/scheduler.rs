//! Fill scheduler: keeps the DMA ring one chunk ahead of playback.
//!
//! ## Handshake
//!
//! Two counters decide which chunk the CPU may touch:
//!
//! - `FillCount`: chunks fully written (and, after the first, with the
//!   preceding chunk's drain acknowledged). Advanced only by the scheduler.
//! - `DrainCount`: chunk completions acknowledged from the DMA side.
//!   Advanced only when a completion is taken.
//!
//! The next chunk to write is `FillCount % 2`, and it may only be written while
//! `FillCount - DrainCount < 2`. Ownership of a chunk therefore alternates by
//! index parity between the CPU and the DMA engine without any lock.
//!
//! ## One iteration ([`FillScheduler::step`])
//!
//! ```text
//!  wait while FillCount - DrainCount >= 2
//!  write chunk FillCount % 2
//!  fence
//!  ├─ AwaitingFirstFill: arm PWM (once) ──► Streaming
//!  └─ Streaming:         wait for completion, take it, DrainCount += 1, fence
//!  FillCount += 1
//! ```
//!
//! The transfer is started before anything is written: it cannot move until
//! the PWM is armed, and the PWM is armed only once chunk 0 is complete.

use core::sync::atomic::{fence, Ordering};

use crate::config::ValidatedConfig;
use crate::constants::{CHUNKS_PER_RING, STATS_LOG_INTERVAL_CHUNKS};
use crate::peripheral::{RingOutput, RingTransfer};
use crate::ring::Ring;
use crate::tone::ToneGenerator;

/// Streaming state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    /// Output not armed; the first chunk is being written.
    AwaitingFirstFill = 0,
    /// Output armed and the DMA engine replaying the ring.
    Streaming = 1,
}

/// `FillCount` / `DrainCount` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handshake {
    filled: u32,
    drained: u32,
}

impl Handshake {
    pub const fn new() -> Self {
        Handshake {
            filled: 0,
            drained: 0,
        }
    }

    pub fn filled(&self) -> u32 {
        self.filled
    }

    pub fn drained(&self) -> u32 {
        self.drained
    }

    /// Chunks written but not yet confirmed drained.
    #[inline]
    pub fn in_flight(&self) -> u32 {
        self.filled.wrapping_sub(self.drained)
    }

    /// Index of the chunk the next fill targets.
    #[inline]
    pub fn target_chunk(&self) -> usize {
        self.filled as usize % CHUNKS_PER_RING
    }

    /// Whether the target chunk is free of the DMA engine.
    #[inline]
    pub fn can_fill(&self) -> bool {
        self.in_flight() < CHUNKS_PER_RING as u32
    }

    /// Whether the fill count just reached a multiple of
    /// [`STATS_LOG_INTERVAL_CHUNKS`].
    pub fn at_stats_interval(&self) -> bool {
        self.filled != 0 && self.filled % STATS_LOG_INTERVAL_CHUNKS == 0
    }

    pub fn record_fill(&mut self) {
        debug_assert!(self.can_fill(), "fill with both chunks in flight");
        self.filled = self.filled.wrapping_add(1);
    }

    pub fn record_drain(&mut self) {
        debug_assert!(self.in_flight() > 0, "drain acknowledged for an unfilled chunk");
        self.drained = self.drained.wrapping_add(1);
    }
}

/// Counters for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamStats {
    pub chunks_filled: u32,
    pub chunks_drained: u32,
    /// Calls to `wait_for_pending_event`, spurious wakeups included.
    pub event_waits: u32,
}

/// Producer side of the ring: owns the generator, the handshake and the
/// output adapter.
///
/// # Example
/// ```ignore
/// let config = ToneConfig::rp2350_default().validate()?;
/// let mut scheduler = FillScheduler::new(ring, config, output);
/// scheduler.run(); // never returns
/// ```
pub struct FillScheduler<'r, O: RingOutput> {
    ring: &'r Ring,
    config: ValidatedConfig,
    generator: ToneGenerator,
    output: O,
    handshake: Handshake,
    state: StreamState,
    started: bool,
    event_waits: u32,
}

impl<'r, O: RingOutput> FillScheduler<'r, O> {
    pub fn new(ring: &'r Ring, config: ValidatedConfig, output: O) -> Self {
        let generator = ToneGenerator::new(&config);
        Self::with_generator(ring, config, generator, output)
    }

    pub fn with_generator(
        ring: &'r Ring,
        config: ValidatedConfig,
        generator: ToneGenerator,
        output: O,
    ) -> Self {
        FillScheduler {
            ring,
            config,
            generator,
            output,
            handshake: Handshake::new(),
            state: StreamState::AwaitingFirstFill,
            started: false,
            event_waits: 0,
        }
    }

    /// Configure PWM and the ring transfer, then start the transfer.
    /// Subsequent calls do nothing.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        let cfg = self.config.get();
        self.output.configure_output(cfg.clock_divisor, cfg.top);
        self.output
            .configure_ring_transfer(&RingTransfer::for_ring(self.ring));
        self.output.start_ring_transfer();
        self.started = true;
    }

    /// Write one chunk and complete its handshake. Blocks in
    /// `wait_for_pending_event` when the ring is not ready.
    pub fn step(&mut self) {
        debug_assert!(self.started, "step() before start()");

        // Guards the two-in-flight bound. The completion wait at the end of
        // every streaming step keeps at most one chunk in flight here.
        while !self.handshake.can_fill() {
            self.take_completion();
        }

        let ring = self.ring;
        // SAFETY: `can_fill` holds, so the DMA engine has finished with this
        // chunk (or the output is not armed yet) and no other reference to it
        // exists.
        let chunk = unsafe { ring.chunk_mut(self.handshake.target_chunk()) };
        self.generator.fill(chunk);

        // Samples must be in memory before the PWM can start pacing reads,
        // and before the completion wait below lets the ring move on.
        fence(Ordering::SeqCst);

        match self.state {
            StreamState::AwaitingFirstFill => {
                if !self.output.is_output_armed() {
                    self.output.arm_output();
                    #[cfg(feature = "defmt")]
                    defmt::info!("output armed after first chunk");
                }
                self.state = StreamState::Streaming;
            }
            StreamState::Streaming => self.take_completion(),
        }

        self.handshake.record_fill();

        #[cfg(feature = "defmt")]
        {
            if self.handshake.at_stats_interval() {
                defmt::info!("stream {}", self.stats());
            }
        }
    }

    /// `start()` then `step()` forever.
    pub fn run(&mut self) -> ! {
        self.start();
        loop {
            self.step();
        }
    }

    /// Block until a completion is pending, take it, and count the drain.
    fn take_completion(&mut self) {
        while !self.output.poll_and_clear_completion() {
            self.output.wait_for_pending_event();
            self.event_waits = self.event_waits.wrapping_add(1);
        }
        // The acknowledgement must not be reordered after the counter update.
        fence(Ordering::SeqCst);
        self.handshake.record_drain();
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn handshake(&self) -> Handshake {
        self.handshake
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            chunks_filled: self.handshake.filled(),
            chunks_drained: self.handshake.drained(),
            event_waits: self.event_waits,
        }
    }

    pub fn generator(&self) -> &ToneGenerator {
        &self.generator
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToneConfig;
    use crate::constants::{RING_WRAP_BITS, SAMPLES_PER_CHUNK};
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        ConfigureOutput(u8, u16),
        ConfigureRing(u8, u32),
        StartRing,
        Arm,
        Wait,
        Poll(bool),
    }

    /// Records every call. Each wait raises one completion.
    struct MockOutput {
        calls: Vec<Call>,
        armed: bool,
        pending: bool,
    }

    impl MockOutput {
        fn new() -> Self {
            MockOutput {
                calls: Vec::new(),
                armed: false,
                pending: false,
            }
        }

        fn count(&self, call: Call) -> usize {
            self.calls.iter().filter(|&&c| c == call).count()
        }
    }

    impl RingOutput for MockOutput {
        fn configure_output(&mut self, clock_divisor: u8, wrap: u16) {
            self.calls.push(Call::ConfigureOutput(clock_divisor, wrap));
        }
        fn arm_output(&mut self) {
            self.armed = true;
            self.calls.push(Call::Arm);
        }
        fn is_output_armed(&self) -> bool {
            self.armed
        }
        fn configure_ring_transfer(&mut self, transfer: &RingTransfer) {
            self.calls
                .push(Call::ConfigureRing(transfer.wrap_bits, transfer.transfers_per_chunk));
        }
        fn start_ring_transfer(&mut self) {
            self.calls.push(Call::StartRing);
        }
        fn wait_for_pending_event(&mut self) {
            self.calls.push(Call::Wait);
            self.pending = true;
        }
        fn poll_and_clear_completion(&mut self) -> bool {
            let p = core::mem::take(&mut self.pending);
            self.calls.push(Call::Poll(p));
            p
        }
    }

    fn config() -> ValidatedConfig {
        ToneConfig::rp2350_default().validate().unwrap()
    }

    #[test]
    fn handshake_bounds() {
        let mut h = Handshake::new();
        assert_eq!(h.in_flight(), 0);
        assert!(h.can_fill());
        assert_eq!(h.target_chunk(), 0);

        h.record_fill();
        assert_eq!(h.target_chunk(), 1);
        h.record_fill();
        assert_eq!(h.in_flight(), 2);
        assert!(!h.can_fill());

        h.record_drain();
        assert!(h.can_fill());
        assert_eq!(h.target_chunk(), 0);
    }

    #[test]
    fn handshake_survives_counter_wrap() {
        let mut h = Handshake {
            filled: u32::MAX,
            drained: u32::MAX - 1,
        };
        assert_eq!(h.in_flight(), 1);
        h.record_fill();
        assert_eq!(h.filled(), 0);
        assert_eq!(h.in_flight(), 2);
        h.record_drain();
        assert_eq!(h.in_flight(), 1);
        assert_eq!(h.target_chunk(), 0);
    }

    #[test]
    #[should_panic(expected = "drain acknowledged")]
    fn handshake_rejects_drain_without_fill() {
        let mut h = Handshake::new();
        h.record_drain();
    }

    #[test]
    fn start_configures_then_starts_transfer_once() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        s.start();
        assert_eq!(
            s.output().calls,
            [
                Call::ConfigureOutput(1, 3199),
                Call::ConfigureRing(RING_WRAP_BITS, SAMPLES_PER_CHUNK as u32),
                Call::StartRing,
            ]
        );
    }

    #[test]
    fn first_step_arms_without_waiting() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        assert_eq!(s.state(), StreamState::AwaitingFirstFill);

        s.step();
        assert_eq!(s.state(), StreamState::Streaming);
        assert_eq!(s.output().calls.last(), Some(&Call::Arm));
        assert_eq!(s.output().count(Call::Wait), 0);
        assert!(!s.output().calls.iter().any(|c| matches!(c, Call::Poll(_))));
        assert_eq!(s.handshake().filled(), 1);
        assert_eq!(s.handshake().drained(), 0);
    }

    #[test]
    fn first_chunk_written_before_arm() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        s.step();
        // Full-scale tone starting at the negative peak: chunk 0 is no longer
        // all zeros, chunk 1 still is.
        let chunk0_written = (0..SAMPLES_PER_CHUNK).any(|i| ring.read_wrapped(i) != 0);
        let chunk1_untouched =
            (SAMPLES_PER_CHUNK..2 * SAMPLES_PER_CHUNK).all(|i| ring.read_wrapped(i) == 0);
        assert!(chunk0_written);
        assert!(chunk1_untouched);
    }

    #[test]
    fn arms_exactly_once() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        for _ in 0..200 {
            s.step();
            assert!(s.handshake().in_flight() <= 2);
        }
        assert_eq!(s.output().count(Call::Arm), 1);
        assert_eq!(s.handshake().filled(), 200);
        assert_eq!(s.handshake().drained(), 199);
    }

    #[test]
    fn already_armed_output_is_not_rearmed() {
        let ring = Ring::new();
        let mut out = MockOutput::new();
        out.armed = true;
        let mut s = FillScheduler::new(&ring, config(), out);
        s.start();
        s.step();
        s.step();
        assert_eq!(s.output().count(Call::Arm), 0);
        assert_eq!(s.state(), StreamState::Streaming);
    }

    #[test]
    fn later_steps_wait_for_completion_before_counting() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        s.step();
        let before = s.output().calls.len();
        s.step();
        // poll (nothing) → wait → poll (completion)
        assert_eq!(
            &s.output().calls[before..],
            &[Call::Poll(false), Call::Wait, Call::Poll(true)]
        );
        assert_eq!(s.stats().event_waits, 1);
        assert_eq!(s.stats().chunks_drained, 1);
        assert_eq!(s.stats().chunks_filled, 2);
    }

    #[test]
    fn stats_interval_hits_once_per_interval() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        assert!(!s.handshake().at_stats_interval());

        let mut hits = Vec::new();
        for _ in 0..2 * STATS_LOG_INTERVAL_CHUNKS {
            s.step();
            if s.handshake().at_stats_interval() {
                hits.push(s.stats());
            }
        }
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunks_filled, STATS_LOG_INTERVAL_CHUNKS);
        assert_eq!(hits[0].chunks_drained, STATS_LOG_INTERVAL_CHUNKS - 1);
        assert_eq!(hits[1].chunks_filled, 2 * STATS_LOG_INTERVAL_CHUNKS);
        // One wait per streaming step with this mock.
        assert_eq!(hits[1].event_waits, 2 * STATS_LOG_INTERVAL_CHUNKS - 1);
    }

    #[test]
    fn both_chunks_in_flight_drains_before_writing() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        s.step();
        // Pretend chunk 1 is also queued: nothing may be written until a
        // completion frees chunk 0.
        s.handshake = Handshake {
            filled: 2,
            drained: 0,
        };
        let before = s.output().calls.len();
        s.step();
        assert_eq!(
            &s.output().calls[before..],
            &[
                Call::Poll(false),
                Call::Wait,
                Call::Poll(true),
                Call::Poll(false),
                Call::Wait,
                Call::Poll(true),
            ]
        );
        assert_eq!(s.handshake().filled(), 3);
        assert_eq!(s.handshake().drained(), 2);
        assert!(s.handshake().in_flight() <= CHUNKS_PER_RING as u32);
    }

    #[test]
    fn alternates_target_chunks() {
        let ring = Ring::new();
        let mut s = FillScheduler::new(&ring, config(), MockOutput::new());
        s.start();
        for i in 0..10u32 {
            assert_eq!(s.handshake().target_chunk(), (i % 2) as usize);
            s.step();
        }
    }
}
