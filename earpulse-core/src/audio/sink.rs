/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Audio sample sinks.
use std::io::{self, Write};

use super::CHANNELS;

/// A destination of the rendered audio.
///
/// Samples are signed 16-bit values of interleaved stereo frames, so the length of each slice
/// is always a multiple of [CHANNELS]. An implementation may block until the samples are accepted,
/// which throttles the synthesis to the playback speed.
pub trait AudioSink {
    /// Accepts interleaved `samples`, blocking if necessary.
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()>;
    /// Pushes any buffered samples down to the device.
    fn flush_samples(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AudioSink for Vec<i16> {
    #[inline]
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        self.extend_from_slice(samples);
        Ok(())
    }
}

impl<S: AudioSink + ?Sized> AudioSink for &mut S {
    #[inline]
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        (**self).write_samples(samples)
    }
    #[inline]
    fn flush_samples(&mut self) -> io::Result<()> {
        (**self).flush_samples()
    }
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    #[inline]
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        (**self).write_samples(samples)
    }
    #[inline]
    fn flush_samples(&mut self) -> io::Result<()> {
        (**self).flush_samples()
    }
}

/// Writes samples as raw little-endian 16-bit PCM data to the underlying writer.
#[derive(Debug)]
pub struct PcmWriter<W> {
    wr: W,
    bytes: Vec<u8>,
}

impl<W: Write> PcmWriter<W> {
    /// Creates a new `PcmWriter` from a given [Writer][Write].
    pub fn new(wr: W) -> Self {
        PcmWriter { wr, bytes: Vec::new() }
    }
}

impl<W> PcmWriter<W> {
    /// Returns a shared reference to the inner writer.
    pub fn get_ref(&self) -> &W {
        &self.wr
    }
    /// Returns a mutable reference to the inner writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.wr
    }
    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.wr
    }
}

impl<W: Write> AudioSink for PcmWriter<W> {
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        self.bytes.clear();
        self.bytes.reserve(samples.len() * 2);
        for sample in samples {
            self.bytes.extend_from_slice(&sample.to_le_bytes());
        }
        self.wr.write_all(&self.bytes)
    }

    fn flush_samples(&mut self) -> io::Result<()> {
        self.wr.flush()
    }
}

/// Counts stereo frames without storing them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter {
    /// The number of frames accepted so far.
    pub frames: u64,
    /// The number of calls to [AudioSink::write_samples].
    pub writes: u64,
}

impl AudioSink for FrameCounter {
    #[inline]
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        self.frames += (samples.len() / CHANNELS) as u64;
        self.writes += 1;
        Ok(())
    }
}
