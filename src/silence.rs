/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Silence between blocks.
#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::audio::AudioSink;
use crate::config::OutputFlags;
use crate::player::{TapeSession, Flow};

impl<S: AudioSink> TapeSession<S> {
    /// Renders `millis` milliseconds of silence.
    ///
    /// If the line rests low and [OutputFlags::TERMINATOR] is set, a terminating pulse is rendered
    /// first and its length is subtracted from the silence, unless the silence is not longer than
    /// the pulse. The silence itself is a single semi-pulse at the level opposite the preceding one,
    /// so the last edge is always followed by a full period at the other level.
    pub(crate) fn emit_silence(&mut self, millis: u32) -> Flow {
        if millis == 0 {
            return Ok(())
        }
        let total = self.clock.millis_to_samples(millis);
        let mut remaining = total;
        if self.config.flags.contains(OutputFlags::TERMINATOR) && self.edge.is_down() {
            let used = self.terminator(self.config.terminator_pulse)? as f64;
            if total > used {
                remaining = total - used;
            }
        }
        trace!("silence: {} ms, {} samples", millis, remaining);
        self.emit_samples(remaining, true)?;
        self.insert_accumulated_error(false)
    }
}

#[cfg(test)]
mod tests {
    use crate::audio::FrameCounter;
    use crate::config::{OutputFlags, TapeConfig};
    use crate::edge::Edge;
    use crate::player::TapeSession;
    use crate::test_utils::*;

    #[test]
    fn silence_after_up_edge_works() {
        let mut session = TapeSession::new(TapeConfig::default(), Vec::new()).unwrap();
        session.emit_pulse(855, true).unwrap();
        session.emit_silence(1000).unwrap();
        let runs = runs_of(session.sink_ref(), session.config().channel_order);
        assert_eq!(runs, vec![
            Run { left: 0x7fff, right: 0x7fff, len: 10 },
            Run { left: -0x0bc3, right: -0x0bc3, len: 44100 },
        ]);
        assert_eq!(session.edge(), Edge::Down);
        assert_eq!(session.owed_samples(), 0.0);
    }

    #[test]
    fn silence_after_down_edge_is_terminated() {
        let mut session = TapeSession::new(TapeConfig::default(), Vec::new()).unwrap();
        session.emit_silence(1000).unwrap();
        let runs = runs_of(session.sink_ref(), session.config().channel_order);
        assert_eq!(runs, vec![
            Run { left: 0x7fff, right: 0x7fff, len: 44 },
            Run { left: -0x0bc3, right: -0x0bc3, len: 44100 - 44 },
        ]);
        assert_eq!(session.edge(), Edge::Down);

        let config = TapeConfig { flags: OutputFlags::STEREO, ..TapeConfig::default() };
        let mut session = TapeSession::new(config, Vec::new()).unwrap();
        session.emit_silence(1000).unwrap();
        let runs = runs_of(session.sink_ref(), session.config().channel_order);
        assert_eq!(runs, vec![Run { left: 0x7fff, right: 0x7fff, len: 44100 }]);
        assert_eq!(session.edge(), Edge::Up);
    }

    #[test]
    fn silence_level_differs_from_preceding_pulse() {
        for &width in [855, 1710, 2168].iter() {
            for &pulses in [1usize, 2].iter() {
                let mut session = TapeSession::new(TapeConfig::default(), Vec::new()).unwrap();
                for _ in 0..pulses {
                    session.emit_pulse(width, true).unwrap();
                }
                session.emit_silence(100).unwrap();
                let runs = runs_of(session.sink_ref(), session.config().channel_order);
                let (fill, before) = (runs[runs.len() - 1], runs[runs.len() - 2]);
                assert_ne!(fill.right, before.right);
                assert_eq!(fill.right, -0x0bc3);
                // an even number of pulses leaves the line low: a terminator precedes the fill
                assert_eq!(runs.len(), pulses * 2);
            }
        }
    }

    #[test]
    fn short_silence_is_never_negative() {
        // 7000 T-states is 88 samples, longer than 1 ms of 44.1 samples
        let config = TapeConfig { terminator_pulse: 7000, ..TapeConfig::default() };
        let mut session = TapeSession::new(config, FrameCounter::default()).unwrap();
        session.emit_silence(1).unwrap();
        assert_eq!(session.sink_ref().frames, 88 + 44);
        let mut session = TapeSession::new(TapeConfig::default(), FrameCounter::default()).unwrap();
        session.emit_silence(2).unwrap();
        assert_eq!(session.sink_ref().frames, 88);
    }

    #[test]
    fn zero_silence_is_noop() {
        let mut session = TapeSession::new(TapeConfig::default(), FrameCounter::default()).unwrap();
        session.emit_silence(0).unwrap();
        assert_eq!(session.sink_ref().frames, 0);
        assert_eq!(session.edge(), Edge::Down);
    }
}
