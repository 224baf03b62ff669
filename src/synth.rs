/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Semi-pulse synthesis.
//!
//! A semi-pulse is a run of identical stereo frames, one half-period of the square wave.
//! Its length is given in T-states and converted to a real-valued number of samples.
//! The integer part is rendered and the fractional part becomes the owed samples, tracked by the
//! [ErrorAccumulator]. Runs longer than [TapeConfig::chunk_samples][crate::config::TapeConfig::chunk_samples]
//! are split into chunks of that size with stop and pause requests checked between them, and
//! the remainder is rendered afterwards as an owed-samples insertion.
use std::io;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::audio::{AudioSink, CHANNELS};
use crate::clock::TStates;
use crate::config::OutputFlags;
use crate::edge::{Edge, scale_volume};
use crate::player::{Flow, TapeSession};

/// Samples owed to the output due to truncating real-valued sample counts.
///
/// The value is recomputed by each semi-pulse rather than compounded across pulses and is reset
/// to zero whenever the owed samples are inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ErrorAccumulator {
    owed: f64
}

impl ErrorAccumulator {
    /// Returns the number of owed samples.
    #[inline]
    pub fn owed(&self) -> f64 {
        self.owed
    }
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.owed == 0.0
    }
    #[inline]
    pub fn set(&mut self, owed: f64) {
        self.owed = owed;
    }
    #[inline]
    pub fn reset(&mut self) {
        self.owed = 0.0;
    }
    /// Returns the whole number of owed samples and resets the accumulator.
    ///
    /// The fraction left over is less than a single sample and is dropped.
    #[inline]
    pub fn take_whole(&mut self) -> usize {
        let whole = self.owed.max(0.0) as usize;
        self.owed = 0.0;
        whole
    }
}

/// Returns the chunk buffer for frames of `chunk_samples` samples.
pub(crate) fn chunk_buffer(chunk_samples: usize) -> Vec<i16> {
    vec![0; chunk_samples * CHANNELS]
}

impl<S: AudioSink> TapeSession<S> {
    /// Renders a semi-pulse of `width` T-states.
    ///
    /// A pulse of 0 T-states renders nothing and leaves the edge untouched.
    pub(crate) fn emit_pulse(&mut self, width: TStates, change_edge: bool) -> Flow {
        if width == 0 {
            return Ok(())
        }
        let samples = self.clock.tstates_to_samples(width);
        self.emit_samples(samples, change_edge)
    }
    /// Renders a semi-pulse of a real-valued number of `samples`.
    pub(crate) fn emit_samples(&mut self, samples: f64, change_edge: bool) -> Flow {
        let samples = samples.max(0.0);
        let count = samples as usize;
        let level = self.edge.advance(change_edge);
        let frame = self.frame_for(level);
        let chunk = self.config.chunk_samples;
        if count <= chunk {
            self.write_run(frame, count)?;
            self.owed.set(samples - count as f64);
        }
        else {
            let mut remaining = count;
            while remaining >= chunk {
                self.write_run(frame, chunk)?;
                remaining -= chunk;
                self.checkpoint()?;
            }
            trace!("split {} samples into {} chunks", count, count / chunk);
            self.owed.set(remaining as f64 + samples.fract());
            self.insert_accumulated_error(false)?;
        }
        self.checkpoint()
    }
    /// Renders the whole owed samples as a continuation of the current level and resets the accumulator.
    ///
    /// The inserted run doesn't represent an edge of its own, so `change_edge` is `false` everywhere
    /// except for the callers that need the inserted run to begin a new level.
    pub(crate) fn insert_accumulated_error(&mut self, change_edge: bool) -> Flow {
        let count = self.owed.take_whole();
        self.insert_samples(count, change_edge)
    }
    /// Renders exactly `count` samples following the same edge rules as a semi-pulse.
    pub(crate) fn insert_samples(&mut self, count: usize, change_edge: bool) -> Flow {
        if count == 0 {
            return Ok(())
        }
        let level = self.edge.advance(change_edge);
        let frame = self.frame_for(level);
        self.write_run(frame, count)?;
        Ok(())
    }
    /// Returns the interleaved frame for the given level and records the debug amplitudes.
    fn frame_for(&mut self, level: Edge) -> [i16; CHANNELS] {
        let config = &self.config;
        let amplitude = level.amplitude(config);
        let right = scale_volume(amplitude, config.volume_right);
        let left = if config.flags.contains(OutputFlags::STEREO) {
            scale_volume(amplitude, config.volume_left)
        }
        else {
            0
        };
        self.last_amps = (right, left);
        config.channel_order.frame(left, right)
    }
    /// Writes `count` copies of `frame` to the sink reusing the chunk buffer.
    fn write_run(&mut self, frame: [i16; CHANNELS], mut count: usize) -> io::Result<()> {
        if self.buffer_frame != Some(frame) {
            for slot in self.buffer.chunks_exact_mut(CHANNELS) {
                slot.copy_from_slice(&frame);
            }
            self.buffer_frame = Some(frame);
        }
        let capacity = self.buffer.len() / CHANNELS;
        while count != 0 {
            let frames = count.min(capacity);
            self.sink.write_samples(&self.buffer[..frames * CHANNELS])?;
            count -= frames;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use rand::prelude::*;
    use crate::audio::FrameCounter;
    use crate::config::TapeConfig;
    use crate::control::{TapeControl, PlaybackState};
    use crate::test_utils::*;

    #[test]
    fn error_accumulator_works() {
        let mut acc = ErrorAccumulator::default();
        assert!(acc.is_zero());
        acc.set(68.75);
        assert_eq!(acc.owed(), 68.75);
        assert_eq!(acc.take_whole(), 68);
        assert!(acc.is_zero());
        acc.set(-0.5);
        assert_eq!(acc.take_whole(), 0);
        acc.set(0.3);
        acc.reset();
        assert_eq!(acc.owed(), 0.0);
    }

    #[test]
    fn short_pulse_works() {
        let mut session = TapeSession::new(TapeConfig::default(), Vec::new()).unwrap();
        session.emit_pulse(2168, true).unwrap();
        assert!((session.owed_samples() - 0.3168).abs() < 1e-9);
        session.emit_pulse(2168, true).unwrap();
        session.emit_pulse(0, true).unwrap();
        let runs = runs_of(session.sink_ref(), session.config().channel_order);
        assert_eq!(runs, vec![
            Run { left: 0x7fff, right: 0x7fff, len: 27 },
            Run { left: -0x0bc3, right: -0x0bc3, len: 27 },
        ]);
        assert_eq!(session.edge(), Edge::Down);
        assert_eq!(session.last_amplitudes(), (-0x0bc3, -0x0bc3));
    }

    #[test]
    fn held_pulse_keeps_level() {
        let mut session = TapeSession::new(TapeConfig::default(), Vec::new()).unwrap();
        session.emit_pulse(855, true).unwrap();
        session.emit_pulse(855, false).unwrap();
        session.emit_pulse(855, true).unwrap();
        let runs = runs_of(session.sink_ref(), session.config().channel_order);
        assert_eq!(runs.iter().map(|r| r.len).collect::<Vec<_>>(), vec![20, 10]);
        assert_eq!(runs[0].right, 0x7fff);
        assert_eq!(runs[1].right, -0x0bc3);
    }

    #[test]
    fn long_pulse_is_split_and_owed_samples_inserted() {
        let config = TapeConfig { chunk_samples: 100, ..TapeConfig::default() };
        let mut session = TapeSession::new(config, FrameCounter::default()).unwrap();
        // 35000 T-states is 441 samples: 4 chunks and 41 owed samples
        session.emit_pulse(35_000, true).unwrap();
        assert_eq!(session.sink_ref().frames, 441);
        assert_eq!(session.sink_ref().writes, 5);
        assert!(session.owed_samples() < 1.0);
        assert_eq!(session.edge(), Edge::Up);
    }

    #[test]
    fn emitted_samples_match_exact_duration() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let chunk_samples = rng.gen_range(1..=512);
            let config = TapeConfig { chunk_samples, ..TapeConfig::default() };
            let mut session = TapeSession::new(config, FrameCounter::default()).unwrap();
            let width: TStates = rng.gen_range(1..=1_000_000);
            let exact = session.clock().tstates_to_samples(width);
            session.emit_pulse(width, rng.gen()).unwrap();
            let emitted = session.sink_ref().frames as f64;
            let owed = session.owed_samples();
            assert!(owed >= 0.0 && owed < 1.0, "owed: {}", owed);
            let lost = exact - emitted;
            assert!(lost >= 0.0 && lost < 1.0, "{} - {} = {}", exact, emitted, lost);
            if exact as usize <= chunk_samples {
                assert!((emitted + owed - exact).abs() < 1e-6, "{} + {} != {}", emitted, owed, exact);
            }
            assert!(session.sink_ref().writes as usize <= (exact as usize / chunk_samples) + 1);
        }
    }

    #[test]
    fn stop_request_aborts_split_pulse() {
        let control = Arc::new(TapeControl::new());
        let config = TapeConfig { chunk_samples: 10, ..TapeConfig::default() };
        let sink = StopAfter::new(Arc::clone(&control), 3, false);
        let mut session = TapeSession::with_control(config, sink, control).unwrap();
        session.state = PlaybackState::Playing;
        assert!(session.emit_pulse(35_000, true).is_err());
        assert_eq!(session.state(), PlaybackState::Stopping);
        assert_eq!(session.sink_ref().frames, 30);
        assert_eq!(session.edge(), Edge::Up);
    }

    #[test]
    fn output_options_are_honored() {
        let mut config = TapeConfig::default();
        config.flags = OutputFlags::INVERSE_POLARITY|OutputFlags::ZERO_LEVEL;
        config.volume_right = 50;
        config.channel_order = crate::audio::ChannelOrder::LeftRight;
        let mut session = TapeSession::new(config, Vec::new()).unwrap();
        session.emit_pulse(855, true).unwrap();
        session.emit_pulse(855, true).unwrap();
        assert_eq!(&session.sink_ref()[..2], &[0, 0]);
        let runs = runs_of(session.sink_ref(), session.config().channel_order);
        assert_eq!(runs, vec![
            Run { left: 0, right: 0, len: 10 },
            Run { left: 0, right: 0x3fff, len: 10 },
        ]);
        assert_eq!(session.last_amplitudes(), (0x3fff, 0));
    }
}
