/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Sinks and helpers shared by the unit tests.
use std::io;
use std::sync::Arc;

use crate::audio::{AudioSink, ChannelOrder, CHANNELS};
use crate::control::TapeControl;

/// A run of identical frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub left: i16,
    pub right: i16,
    pub len: usize
}

/// Groups interleaved `samples` into runs of identical frames.
pub fn runs_of(samples: &[i16], order: ChannelOrder) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for frame in samples.chunks_exact(CHANNELS) {
        let (left, right) = order.split([frame[0], frame[1]]);
        match runs.last_mut() {
            Some(run) if run.left == left && run.right == right => run.len += 1,
            _ => runs.push(Run { left, right, len: 1 })
        }
    }
    runs
}

/// Counts frames and raises a stop or a pause request on the given write.
#[derive(Debug)]
pub struct StopAfter {
    pub frames: u64,
    pub writes: u64,
    control: Arc<TapeControl>,
    after_writes: u64,
    pause: bool
}

impl StopAfter {
    pub fn new(control: Arc<TapeControl>, after_writes: u64, pause: bool) -> Self {
        StopAfter { frames: 0, writes: 0, control, after_writes, pause }
    }
}

impl AudioSink for StopAfter {
    fn write_samples(&mut self, samples: &[i16]) -> io::Result<()> {
        self.frames += (samples.len() / CHANNELS) as u64;
        self.writes += 1;
        if self.writes == self.after_writes {
            if self.pause {
                self.control.request_pause();
            }
            else {
                self.control.request_stop();
            }
        }
        Ok(())
    }
}

/// Fails every write.
#[derive(Debug)]
pub struct FailingSink;

impl AudioSink for FailingSink {
    fn write_samples(&mut self, _samples: &[i16]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "disconnected"))
    }
}
