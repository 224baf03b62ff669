/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    EARPULSE is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    EARPULSE is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
//! EARPULSE renders ZX Spectrum tape blocks as the square-wave signal the ROM loading routine
//! expects on its EAR input, producing interleaved stereo 16-bit PCM frames.
//!
//! Pulse lengths are given in T-states and converted to samples with sub-sample precision.
//! The fraction lost to truncation is owed to the output and inserted after each long run
//! and each silence, so the rendered signal never drifts by more than a sample.
//!
//! A [TapeSession] renders blocks into any [AudioSink][audio::AudioSink]. Its playback may be
//! stopped or paused from another thread via the shared [TapeControl].
//!
//! ```
//! use earpulse::{TapeConfig, TapeSession, BlockOutcome};
//! use earpulse::audio::PcmWriter;
//!
//! let mut session = TapeSession::new(TapeConfig::default(), PcmWriter::new(Vec::new())).unwrap();
//! let outcome = session.play_tap_block(&[0x00, 0x03, b'h', b'e', b'l', b'l', b'o']).unwrap();
//! assert_eq!(outcome, BlockOutcome::Completed);
//! let pcm: Vec<u8> = session.into_sink().into_inner();
//! assert!(!pcm.is_empty());
//! ```
pub mod config;
pub mod control;
pub mod edge;
pub mod player;
pub mod synth;
mod block;
mod silence;
mod tone;

#[cfg(test)]
mod test_utils;

pub use earpulse_core::clock;

/// Audio samples, sinks and the real-time output.
pub mod audio {
    pub use earpulse_core::audio::*;
    #[cfg(feature = "audio")]
    pub use earpulse_audio::carousel;
    #[cfg(feature = "cpal")]
    pub use earpulse_audio::host;
}

pub use block::FULL_BYTE_BITS;
pub use config::{TapeConfig, OutputFlags, ConfigError, ConfigErrorKind};
pub use control::{TapeControl, Progress, ProgressSnapshot, PlaybackState};
pub use edge::Edge;
pub use player::{TapeSession, BlockOutcome};
pub use synth::ErrorAccumulator;
