/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! # Audio API.
mod sample;
mod sink;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

pub use sample::{AudioSample, FromSample};
pub use sink::{AudioSink, PcmWriter, FrameCounter};

/// The number of interleaved audio channels in every rendered frame.
pub const CHANNELS: usize = 2;

/// Determines which channel's sample comes first in each interleaved stereo frame.
///
/// This depends on the DAC or driver the samples are eventually fed to.
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// The right channel sample goes first.
    RightLeft,
    /// The left channel sample goes first.
    LeftRight,
}

impl Default for ChannelOrder {
    fn default() -> Self {
        ChannelOrder::RightLeft
    }
}

impl ChannelOrder {
    /// Returns a single interleaved frame made of the `left` and `right` samples.
    #[inline]
    pub fn frame<T>(self, left: T, right: T) -> [T; CHANNELS] {
        match self {
            ChannelOrder::RightLeft => [right, left],
            ChannelOrder::LeftRight => [left, right],
        }
    }
    /// Returns the `(left, right)` samples from the interleaved `frame`.
    #[inline]
    pub fn split<T: Copy>(self, frame: [T; CHANNELS]) -> (T, T) {
        match self {
            ChannelOrder::RightLeft => (frame[1], frame[0]),
            ChannelOrder::LeftRight => (frame[0], frame[1]),
        }
    }
}
