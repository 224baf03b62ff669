/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Native audio output for the synthesized tape signal.
//!
//! Enable the `cpal` feature of `earpulse-audio` to stream the signal to the default output
//! device of the host.
use core::convert::TryInto;
use core::fmt;
use std::error::Error;

use earpulse_core::audio::CHANNELS;

#[cfg(feature = "cpal")]
pub mod cpal;

/// Categories of [AudioHandleError].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioHandleErrorKind {
    /// The audio host or the output device is not available.
    AudioSubsystem,
    /// The output stream could not be built, started or paused.
    AudioStream,
    /// The requested stream parameters can't carry the signal, e.g. a stream with other than
    /// 2 channels, since every rendered frame is a stereo pair.
    InvalidArguments,
}

/// The error returned when opening or controlling an output stream.
#[derive(Debug, Clone)]
pub struct AudioHandleError {
    description: String,
    kind: AudioHandleErrorKind
}

impl fmt::Display for AudioHandleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.description.fmt(f)
    }
}

impl Error for AudioHandleError {}

impl AudioHandleError {
    pub fn kind(&self) -> AudioHandleErrorKind {
        self.kind
    }
}

impl From<(String, AudioHandleErrorKind)> for AudioHandleError {
    fn from((description, kind): (String, AudioHandleErrorKind)) -> Self {
        AudioHandleError { description, kind }
    }
}

/// Returns the number of stream channels as `u8` if it matches the stereo frames of the signal.
pub fn stereo_channels<C>(channels: C) -> Result<u8, AudioHandleError>
    where C: Copy + fmt::Display + TryInto<u8>
{
    match channels.try_into() {
        Ok(count) if count as usize == CHANNELS => Ok(count),
        _ => Err((format!("number of channels: {} but stereo output is required", channels),
                  AudioHandleErrorKind::InvalidArguments).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_handle_error_works() {
        let err = AudioHandleError::from(("no device".to_string(), AudioHandleErrorKind::AudioSubsystem));
        assert_eq!(err.kind(), AudioHandleErrorKind::AudioSubsystem);
        assert_eq!(err.to_string(), "no device");
    }

    #[test]
    fn stereo_channels_works() {
        assert_eq!(stereo_channels(2u16).unwrap(), 2);
        for &channels in [0u16, 1, 6, 256, 258].iter() {
            let err = stereo_channels(channels).unwrap_err();
            assert_eq!(err.kind(), AudioHandleErrorKind::InvalidArguments);
            assert_eq!(err.to_string(),
                       format!("number of channels: {} but stereo output is required", channels));
        }
    }
}
