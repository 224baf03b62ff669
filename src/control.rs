/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Playback control requests and loading progress.
//!
//! A [TapeControl] is shared through an [Arc][std::sync::Arc] between the thread rendering the
//! signal and the control surface, which may live in another thread. The control surface only
//! raises requests and reads the progress. The renderer polls the requests at pulse, lead pulse
//! and byte boundaries and is the only writer of the progress counters.
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// The state of a playback session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// No block is being played.
    Idle,
    /// A block is being played.
    Playing,
    /// A stop request was observed. The session must be reset before it plays again.
    Stopping,
    /// A pause request was observed. The session may be resumed.
    Pausing
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Idle
    }
}

impl PlaybackState {
    /// Returns `true` if a stop or a pause request has been observed.
    #[inline]
    pub fn is_halted(self) -> bool {
        matches!(self, PlaybackState::Stopping|PlaybackState::Pausing)
    }
}

/// Stop and pause requests together with the loading progress.
#[derive(Debug, Default)]
pub struct TapeControl {
    stop: AtomicBool,
    pause: AtomicBool,
    /// Counters updated while the data bytes are being played.
    pub progress: Progress,
}

impl TapeControl {
    pub fn new() -> Self {
        Self::default()
    }
    /// Requests the current block to stop.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
    /// Requests the current block to pause.
    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::Release);
    }
    /// Withdraws both requests.
    pub fn clear_requests(&self) {
        self.stop.store(false, Ordering::Release);
        self.pause.store(false, Ordering::Release);
    }
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
    #[inline]
    pub fn is_pause_requested(&self) -> bool {
        self.pause.load(Ordering::Acquire)
    }
}

/// Loading progress counters.
#[derive(Debug, Default)]
pub struct Progress {
    bytes_loaded: AtomicUsize,
    bytes_expected: AtomicUsize,
    block_bytes: AtomicUsize,
    block_percent: AtomicU32,
    total_percent: AtomicU32,
}

/// A copy of the [Progress] counters at some point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Bytes played since the transfer began.
    pub bytes_loaded: usize,
    /// Bytes in the whole transfer.
    pub bytes_expected: usize,
    /// Bytes played by the most recent data part.
    pub block_bytes: usize,
    /// The position in the most recent data part, in percent.
    pub block_percent: u32,
    /// The position in the whole transfer, in percent.
    pub total_percent: u32,
}

impl Progress {
    /// Resets the counters and sets the number of bytes in the whole transfer.
    pub fn begin_transfer(&self, bytes_expected: usize) {
        self.bytes_expected.store(bytes_expected, Ordering::Relaxed);
        self.bytes_loaded.store(0, Ordering::Relaxed);
        self.block_bytes.store(0, Ordering::Relaxed);
        self.block_percent.store(0, Ordering::Relaxed);
        self.total_percent.store(0, Ordering::Relaxed);
    }
    /// Returns the current values of all counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_loaded: self.bytes_loaded.load(Ordering::Relaxed),
            bytes_expected: self.bytes_expected.load(Ordering::Relaxed),
            block_bytes: self.block_bytes.load(Ordering::Relaxed),
            block_percent: self.block_percent.load(Ordering::Relaxed),
            total_percent: self.total_percent.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn begin_block(&self) {
        self.block_bytes.store(0, Ordering::Relaxed);
        self.block_percent.store(0, Ordering::Relaxed);
    }
    /// Called before the byte at `index` of a `len` byte data part is played.
    pub(crate) fn enter_byte(&self, index: usize, len: usize) {
        let percent = (index + 1) * 100 / len;
        self.block_percent.store(percent as u32, Ordering::Relaxed);
        let loaded = self.clamp_loaded();
        self.update_total(loaded);
    }
    /// Called after a whole byte has been played.
    pub(crate) fn byte_loaded(&self) {
        self.bytes_loaded.fetch_add(1, Ordering::Relaxed);
        self.block_bytes.fetch_add(1, Ordering::Relaxed);
    }
    /// Called after a data part has been played in full.
    pub(crate) fn end_block(&self) {
        let loaded = self.clamp_loaded();
        self.update_total(loaded);
    }

    fn clamp_loaded(&self) -> usize {
        let expected = self.bytes_expected.load(Ordering::Relaxed);
        let loaded = self.bytes_loaded.load(Ordering::Relaxed);
        if expected != 0 && loaded > expected {
            self.bytes_loaded.store(expected, Ordering::Relaxed);
            expected
        }
        else {
            loaded
        }
    }

    fn update_total(&self, loaded: usize) {
        let expected = self.bytes_expected.load(Ordering::Relaxed);
        let percent = if expected == 0 { 0 } else { loaded * 100 / expected };
        self.total_percent.store(percent as u32, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tape_control_works() {
        let control = TapeControl::new();
        assert!(!control.is_stop_requested());
        assert!(!control.is_pause_requested());
        control.request_stop();
        control.request_pause();
        assert!(control.is_stop_requested());
        assert!(control.is_pause_requested());
        control.clear_requests();
        assert!(!control.is_stop_requested());
        assert!(!control.is_pause_requested());
        assert!(PlaybackState::Stopping.is_halted());
        assert!(PlaybackState::Pausing.is_halted());
        assert!(!PlaybackState::Playing.is_halted());
        assert!(!PlaybackState::default().is_halted());
    }

    #[test]
    fn progress_works() {
        let progress = Progress::default();
        progress.begin_transfer(4);
        progress.begin_block();
        for index in 0..2 {
            progress.enter_byte(index, 2);
            progress.byte_loaded();
        }
        progress.end_block();
        assert_eq!(progress.snapshot(), ProgressSnapshot {
            bytes_loaded: 2, bytes_expected: 4, block_bytes: 2, block_percent: 100, total_percent: 50
        });
        progress.begin_block();
        for index in 0..3 {
            progress.enter_byte(index, 3);
            progress.byte_loaded();
        }
        progress.end_block();
        let snap = progress.snapshot();
        assert_eq!(snap.bytes_loaded, 4);
        assert_eq!(snap.block_bytes, 3);
        assert_eq!(snap.total_percent, 100);
        progress.begin_transfer(0);
        progress.enter_byte(0, 1);
        progress.byte_loaded();
        progress.end_block();
        let snap = progress.snapshot();
        assert_eq!(snap.bytes_loaded, 1);
        assert_eq!(snap.total_percent, 0);
    }
}
