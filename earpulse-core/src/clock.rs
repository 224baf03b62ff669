/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Conversion between the emulated CPU clock and the audio sample clock.

/// A duration measured in the emulated CPU clock cycles (T-states).
pub type TStates = u32;

/// Milliseconds in a second.
const MILLIS_PER_SEC: f64 = 1000.0;

/// Maps durations expressed in the CPU clock cycles to a number of audio samples and back.
///
/// No rounding is ever performed here. The fractional part of a sample count is what the pulse
/// synthesizer tracks as owed samples, so the full precision must reach the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConverter {
    cpu_hz: f64,
    sample_rate: u32,
}

impl TimingConverter {
    /// Creates a new converter from the CPU clock frequency in Hz and the audio sample rate.
    ///
    /// # Panics
    /// Panics if `cpu_hz` is not a positive finite number or if `sample_rate` is 0.
    /// Both are session-wide preconditions and should be validated once, before any pulse is rendered.
    pub fn new(cpu_hz: f64, sample_rate: u32) -> Self {
        assert!(cpu_hz.is_finite() && cpu_hz > 0.0, "the CPU clock frequency must be a positive number");
        assert!(sample_rate > 0, "the sample rate must be greater than 0");
        TimingConverter { cpu_hz, sample_rate }
    }
    /// Returns the CPU clock frequency in Hz.
    #[inline]
    pub fn cpu_hz(&self) -> f64 {
        self.cpu_hz
    }
    /// Returns the number of audio frames per second.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
    /// Returns the real-valued number of samples spanning `ts` T-states.
    #[inline]
    pub fn tstates_to_samples(&self, ts: TStates) -> f64 {
        ts as f64 / self.cpu_hz * self.sample_rate as f64
    }
    /// Returns the real-valued number of T-states spanning `samples` audio samples.
    #[inline]
    pub fn samples_to_tstates(&self, samples: f64) -> f64 {
        samples / self.sample_rate as f64 * self.cpu_hz
    }
    /// Returns the real-valued number of samples spanning `millis` milliseconds.
    #[inline]
    pub fn millis_to_samples(&self, millis: u32) -> f64 {
        millis as f64 / MILLIS_PER_SEC * self.sample_rate as f64
    }
    /// Returns the real-valued number of T-states spanning `millis` milliseconds.
    #[inline]
    pub fn millis_to_tstates(&self, millis: u32) -> f64 {
        millis as f64 / MILLIS_PER_SEC * self.cpu_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_converter_works() {
        let clock = TimingConverter::new(3_500_000.0, 44100);
        assert_eq!(clock.cpu_hz(), 3_500_000.0);
        assert_eq!(clock.sample_rate(), 44100);
        assert_eq!(clock.tstates_to_samples(0), 0.0);
        assert_eq!(clock.tstates_to_samples(3_500_000), 44100.0);
        let lead = clock.tstates_to_samples(2168);
        assert!((lead - 27.3168).abs() < 1e-9, "{}", lead);
        assert_eq!(lead as usize, 27);
        let zero = clock.tstates_to_samples(855);
        assert!((zero - 10.773).abs() < 1e-9, "{}", zero);
        assert_eq!(clock.millis_to_samples(0), 0.0);
        assert_eq!(clock.millis_to_samples(1000), 44100.0);
        assert_eq!(clock.millis_to_samples(500), 22050.0);
        assert!((clock.millis_to_tstates(1) - 3500.0).abs() < 1e-9);
        let ts = clock.samples_to_tstates(lead);
        assert!((ts - 2168.0).abs() < 1e-6, "{}", ts);
    }

    #[test]
    #[should_panic]
    fn timing_converter_rejects_zero_cpu_clock() {
        let _ = TimingConverter::new(0.0, 44100);
    }

    #[test]
    #[should_panic]
    fn timing_converter_rejects_zero_sample_rate() {
        let _ = TimingConverter::new(3_500_000.0, 0);
    }
}
