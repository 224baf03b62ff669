/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Lead tones, sync pulses, bits and the terminator.
use crate::audio::AudioSink;
use crate::clock::TStates;
use crate::player::{Break, TapeSession, Flow};

impl<S: AudioSink> TapeSession<S> {
    /// Renders a single bit as two semi-pulses: one full square-wave period.
    pub(crate) fn bit_tone(&mut self, bit: bool) -> Flow {
        if bit { self.bit_one() } else { self.bit_zero() }
    }

    pub(crate) fn bit_zero(&mut self) -> Flow {
        let width = self.config.zero_pulse;
        self.emit_pulse(width, true)?;
        self.emit_pulse(width, true)
    }

    pub(crate) fn bit_one(&mut self) -> Flow {
        let width = self.config.one_pulse;
        self.emit_pulse(width, true)?;
        self.emit_pulse(width, true)
    }

    pub(crate) fn sync_pulse(&mut self, width: TStates) -> Flow {
        self.emit_pulse(width, true)
    }
    /// Renders `count` edge-changing semi-pulses of `width` T-states.
    ///
    /// Stop and pause requests are checked after each pulse.
    pub(crate) fn pilot_tone(&mut self, width: TStates, count: u32) -> Flow {
        for _ in 0..count {
            self.emit_pulse(width, true)?;
        }
        Ok(())
    }
    /// Renders an edge-changing semi-pulse so the last data edge is recognized before a silence.
    ///
    /// Returns the number of samples rendered.
    pub(crate) fn terminator(&mut self, width: TStates) -> Result<usize, Break> {
        let samples = self.clock.tstates_to_samples(width) as usize;
        self.emit_pulse(width, true)?;
        self.owed.reset();
        Ok(samples)
    }
}
