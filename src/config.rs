/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Session-wide configuration of the tape signal synthesizer.
use core::fmt;
use std::error::Error;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

use bitflags::bitflags;

use crate::clock::TStates;
pub use crate::audio::ChannelOrder;

pub mod consts {
    //! Standard ZX Spectrum ROM tape timings and the default output parameters.
    use crate::clock::TStates;
    /// The ZX Spectrum 48k CPU clock frequency in Hz.
    pub const CPU_HZ: f64 = 3_500_000.0;
    /// The default number of audio frames per second.
    pub const SAMPLE_RATE: u32 = 44_100;
    /// Length of the lead pulse in T-states.
    pub const LEAD_PULSE_LENGTH: TStates = 2168;
    /// Length of the 1st sync pulse in T-states.
    pub const SYNC_PULSE1_LENGTH: TStates = 667;
    /// Length of the 2nd sync pulse in T-states.
    pub const SYNC_PULSE2_LENGTH: TStates = 735;
    /// Length of the bit value 0 pulse in T-states.
    pub const ZERO_PULSE_LENGTH: TStates = 855;
    /// Length of the bit value 1 pulse in T-states.
    pub const ONE_PULSE_LENGTH: TStates = 1710;
    /// Length of the terminating pulse in T-states (1 ms).
    pub const TERMINATOR_PULSE_LENGTH: TStates = 3500;
    /// The number of LEAD pulses for the header block.
    pub const LEAD_PULSES_HEAD: u32 = 8063;
    /// The number of LEAD pulses for the data block.
    pub const LEAD_PULSES_DATA: u32 = 3223;
    /// The silence following each block in milliseconds.
    pub const PAUSE_MILLIS: u32 = 1000;
    /// The settling gap between blocks in milliseconds.
    pub const END_GAP_MILLIS: u32 = 3000;
    /// The high output level.
    pub const LEVEL_HIGH: i16 = 0x7fff;
    /// The low output level reference.
    pub const LEVEL_LOW: i16 = -0x0bc3;
    /// The maximum channel volume.
    pub const MAX_VOLUME: u8 = 100;
    /// The maximum number of samples rendered in one go.
    pub const CHUNK_SAMPLES: usize = 256;
}

use consts::*;

bitflags! {
    /// Output signal options.
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serialize", serde(from = "u8", into = "u8"))]
    #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct OutputFlags: u8 {
        /// The logical UP level is rendered as the low amplitude and vice versa.
        const INVERSE_POLARITY = 0b0001;
        /// The low amplitude is 0 instead of the negative reference level.
        const ZERO_LEVEL       = 0b0010;
        /// The left channel is rendered. Otherwise it stays silent.
        const STEREO           = 0b0100;
        /// A terminating pulse precedes each silence if the line rests low.
        const TERMINATOR       = 0b1000;
    }
}

impl Default for OutputFlags {
    fn default() -> Self {
        OutputFlags::STEREO|OutputFlags::TERMINATOR
    }
}

impl From<u8> for OutputFlags {
    fn from(flags: u8) -> Self {
        OutputFlags::from_bits_truncate(flags)
    }
}

impl From<OutputFlags> for u8 {
    fn from(flags: OutputFlags) -> u8 {
        flags.bits()
    }
}

/// The configuration of a single tape playback session.
///
/// The defaults reproduce the timings expected by the ZX Spectrum ROM loading routine,
/// rendered at 44.1 kHz.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct TapeConfig {
    /// The emulated CPU clock frequency in Hz.
    pub cpu_hz: f64,
    /// The number of audio frames per second.
    pub sample_rate: u32,
    /// The default lead (pilot) pulse length in T-states.
    pub lead_pulse: TStates,
    /// The 1st sync pulse length in T-states.
    pub sync_pulse1: TStates,
    /// The 2nd sync pulse length in T-states.
    pub sync_pulse2: TStates,
    /// The bit 0 pulse length in T-states.
    pub zero_pulse: TStates,
    /// The bit 1 pulse length in T-states.
    pub one_pulse: TStates,
    /// The terminating pulse length in T-states.
    pub terminator_pulse: TStates,
    /// The default silence following a block in milliseconds.
    pub pause_ms: u32,
    /// The silence emitted by the end of block gap in milliseconds.
    pub end_gap_ms: u32,
    /// The left channel volume in the range `[0, 100]`.
    pub volume_left: u8,
    /// The right channel volume in the range `[0, 100]`.
    pub volume_right: u8,
    /// The high output amplitude.
    pub level_high: i16,
    /// The low output amplitude, unless [OutputFlags::ZERO_LEVEL] is set.
    pub level_low: i16,
    /// Output signal options.
    pub flags: OutputFlags,
    /// The order of channels in each rendered frame.
    pub channel_order: ChannelOrder,
    /// Pulses longer than this number of samples are rendered in chunks of this size.
    pub chunk_samples: usize,
}

impl Default for TapeConfig {
    fn default() -> Self {
        TapeConfig {
            cpu_hz: CPU_HZ,
            sample_rate: SAMPLE_RATE,
            lead_pulse: LEAD_PULSE_LENGTH,
            sync_pulse1: SYNC_PULSE1_LENGTH,
            sync_pulse2: SYNC_PULSE2_LENGTH,
            zero_pulse: ZERO_PULSE_LENGTH,
            one_pulse: ONE_PULSE_LENGTH,
            terminator_pulse: TERMINATOR_PULSE_LENGTH,
            pause_ms: PAUSE_MILLIS,
            end_gap_ms: END_GAP_MILLIS,
            volume_left: MAX_VOLUME,
            volume_right: MAX_VOLUME,
            level_high: LEVEL_HIGH,
            level_low: LEVEL_LOW,
            flags: OutputFlags::default(),
            channel_order: ChannelOrder::default(),
            chunk_samples: CHUNK_SAMPLES,
        }
    }
}

/// A list specifying categories of [ConfigError] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The CPU clock frequency is not a positive number.
    CpuClock,
    /// The sample rate is 0.
    SampleRate,
    /// One of the pulse lengths is 0.
    PulseLength,
    /// A channel volume exceeds 100.
    Volume,
    /// The low level exceeds the high level.
    Levels,
    /// The chunk size is 0 or longer than one second of samples.
    ChunkSize,
}

/// The error returned when a [TapeConfig] can't be used to render a signal.
#[derive(Debug, Clone)]
pub struct ConfigError {
    description: String,
    kind: ConfigErrorKind
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.description.fmt(f)
    }
}

impl Error for ConfigError {}

impl ConfigError {
    /// Returns the corresponding category for this error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl From<(String, ConfigErrorKind)> for ConfigError {
    fn from((description, kind): (String, ConfigErrorKind)) -> Self {
        ConfigError { description, kind }
    }
}

impl TapeConfig {
    /// Checks the session-wide preconditions.
    ///
    /// This is performed once when a session is created, never per pulse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cpu_hz.is_finite() && self.cpu_hz > 0.0) {
            return Err((format!("invalid CPU clock frequency: {}", self.cpu_hz),
                        ConfigErrorKind::CpuClock).into())
        }
        if self.sample_rate == 0 {
            return Err(("the sample rate must be greater than 0".to_string(),
                        ConfigErrorKind::SampleRate).into())
        }
        let pulses = [
            ("lead", self.lead_pulse),
            ("sync1", self.sync_pulse1),
            ("sync2", self.sync_pulse2),
            ("zero", self.zero_pulse),
            ("one", self.one_pulse),
            ("terminator", self.terminator_pulse),
        ];
        if let Some((name, _)) = pulses.iter().find(|(_, len)| *len == 0) {
            return Err((format!("the {} pulse length must be greater than 0", name),
                        ConfigErrorKind::PulseLength).into())
        }
        for &(name, volume) in [("left", self.volume_left), ("right", self.volume_right)].iter() {
            if volume > MAX_VOLUME {
                return Err((format!("the {} channel volume: {} exceeds {}", name, volume, MAX_VOLUME),
                            ConfigErrorKind::Volume).into())
            }
        }
        if self.level_low > self.level_high {
            return Err((format!("the low level: {} exceeds the high level: {}", self.level_low, self.level_high),
                        ConfigErrorKind::Levels).into())
        }
        if self.chunk_samples == 0 {
            return Err(("the chunk size must be greater than 0".to_string(),
                        ConfigErrorKind::ChunkSize).into())
        }
        if self.chunk_samples > self.sample_rate as usize {
            return Err((format!("the chunk size: {} exceeds one second of samples: {}",
                                self.chunk_samples, self.sample_rate),
                        ConfigErrorKind::ChunkSize).into())
        }
        Ok(())
    }
    /// Returns the number of lead pulses the ROM routine saves for a block with the given `flag` byte.
    pub fn lead_count_for_flag(flag: u8) -> u32 {
        if flag & 0x80 == 0 {
            LEAD_PULSES_HEAD
        } else {
            LEAD_PULSES_DATA
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TapeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.flags, OutputFlags::STEREO|OutputFlags::TERMINATOR);
        assert_eq!(config.channel_order, ChannelOrder::RightLeft);
        assert_eq!(TapeConfig::lead_count_for_flag(0x00), LEAD_PULSES_HEAD);
        assert_eq!(TapeConfig::lead_count_for_flag(0xff), LEAD_PULSES_DATA);
    }

    #[test]
    fn config_validation_works() {
        let check = |config: TapeConfig| config.validate().unwrap_err().kind();
        assert_eq!(check(TapeConfig { cpu_hz: 0.0, ..Default::default() }), ConfigErrorKind::CpuClock);
        assert_eq!(check(TapeConfig { cpu_hz: -1.0, ..Default::default() }), ConfigErrorKind::CpuClock);
        assert_eq!(check(TapeConfig { cpu_hz: f64::NAN, ..Default::default() }), ConfigErrorKind::CpuClock);
        assert_eq!(check(TapeConfig { sample_rate: 0, ..Default::default() }), ConfigErrorKind::SampleRate);
        assert_eq!(check(TapeConfig { one_pulse: 0, ..Default::default() }), ConfigErrorKind::PulseLength);
        assert_eq!(check(TapeConfig { volume_right: 101, ..Default::default() }), ConfigErrorKind::Volume);
        assert_eq!(check(TapeConfig { level_low: 1, level_high: 0, ..Default::default() }), ConfigErrorKind::Levels);
        assert_eq!(check(TapeConfig { chunk_samples: 0, ..Default::default() }), ConfigErrorKind::ChunkSize);
        assert_eq!(check(TapeConfig { chunk_samples: 44_101, ..Default::default() }), ConfigErrorKind::ChunkSize);
        assert_eq!(check(TapeConfig { chunk_samples: usize::MAX, ..Default::default() }), ConfigErrorKind::ChunkSize);
        assert!(TapeConfig { chunk_samples: 44_100, ..Default::default() }.validate().is_ok());
        assert!(TapeConfig { chunk_samples: 1, sample_rate: 1, ..Default::default() }.validate().is_ok());
        let err = TapeConfig { terminator_pulse: 0, ..Default::default() }.validate().unwrap_err();
        assert_eq!(err.to_string(), "the terminator pulse length must be greater than 0");
    }

    #[test]
    fn output_flags_from_u8_works() {
        assert_eq!(u8::from(OutputFlags::default()), 0b1100);
        assert_eq!(OutputFlags::from(0xff), OutputFlags::all());
        assert_eq!(OutputFlags::from(0b0011), OutputFlags::INVERSE_POLARITY|OutputFlags::ZERO_LEVEL);
    }

    #[cfg(feature = "serialize")]
    #[test]
    fn config_serde_works() {
        let config = TapeConfig {
            flags: OutputFlags::ZERO_LEVEL,
            channel_order: ChannelOrder::LeftRight,
            pause_ms: 500,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let config2: TapeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, config2);
        let config3: TapeConfig = serde_json::from_str(r#"{"flags":2,"volume_left":50}"#).unwrap();
        assert_eq!(config3.flags, OutputFlags::ZERO_LEVEL);
        assert_eq!(config3.volume_left, 50);
        assert_eq!(config3.sample_rate, SAMPLE_RATE);
    }
}
