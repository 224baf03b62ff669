/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! An audio frame buffer carousel.
//!
//! Frame buffers circulate between the [AudioFrameProducer] and the [AudioFrameConsumer] through a pair
//! of bounded channels. The producer fills a buffer with samples and sends it to the consumer. Before
//! it can continue, it has to receive an emptied buffer back, so the producer is blocked whenever the
//! consumer lags behind by more than `latency` frames. This keeps the synthesis in pace with the
//! audio device.
use core::fmt;
use core::mem::{replace, swap};
use core::ops::{Deref, DerefMut};
use std::error;
use std::io;
use std::sync::mpsc::{sync_channel, SyncSender, Receiver, SendError, RecvError, TryRecvError};

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use earpulse_core::audio::{AudioSample, AudioSink, FromSample};

pub type AudioFrameResult<T> = Result<T, AudioFrameError>;

/// The error returned when the other end of the carousel has been dropped.
#[derive(Debug, Clone)]
pub struct AudioFrameError;

impl fmt::Display for AudioFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the remote thread has been terminated")
    }
}

impl error::Error for AudioFrameError {}

impl<T> From<SendError<T>> for AudioFrameError {
    fn from(_error: SendError<T>) -> Self {
        AudioFrameError
    }
}

impl From<RecvError> for AudioFrameError {
    fn from(_error: RecvError) -> Self {
        AudioFrameError
    }
}

impl From<AudioFrameError> for io::Error {
    fn from(error: AudioFrameError) -> Self {
        io::Error::new(io::ErrorKind::BrokenPipe, error)
    }
}

/// A single frame of interleaved samples.
#[derive(Clone, Debug)]
pub struct AudioBuffer<T>(pub Vec<T>);

impl<T> Deref for AudioBuffer<T> {
    type Target = Vec<T>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for AudioBuffer<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: AudioSample> AudioBuffer<T> {
    fn new(frame_samples: usize, channels: u8) -> Self {
        let size = frame_samples * channels as usize;
        AudioBuffer(vec![T::silence(); size])
    }
}

impl<T: Copy> AudioBuffer<T> {
    #[inline]
    fn copy_to(&self, target: &mut [T], src_offset: usize) -> usize {
        let end_offset = self.0.len().min(src_offset + target.len());
        let source = &self.0[src_offset..end_offset];
        let copied_size = source.len();
        target[..copied_size].copy_from_slice(source);
        copied_size
    }
}

/// The receiving end of the carousel, meant to live in the audio thread.
#[derive(Debug)]
pub struct AudioFrameConsumer<T> {
    buffer: AudioBuffer<T>,
    cursor: usize,
    producer_tx: SyncSender<AudioBuffer<T>>,
    rx: Receiver<AudioBuffer<T>>,
}

/// The sending end of the carousel, meant to live in the synthesis thread.
///
/// Implements [AudioSink], so it can be handed directly to a tape session.
#[derive(Debug)]
pub struct AudioFrameProducer<T> {
    buffer: AudioBuffer<T>,
    frame_len: usize,
    rx: Receiver<AudioBuffer<T>>,
    consumer_tx: SyncSender<AudioBuffer<T>>,
}

/// Creates an interconnected pair of the audio frame producer and consumer.
///
/// * `latency` is the number of frames that can be in flight; values below 1 are treated as 1.
/// * `frame_samples` is the number of samples per channel in a single frame.
/// * `channels` is the number of interleaved channels.
///
/// The consumer starts with `latency` silent frames queued up.
pub fn create_carousel<T>(latency: usize, frame_samples: usize, channels: u8) ->
                                                (AudioFrameProducer<T>, AudioFrameConsumer<T>)
where T: AudioSample
{
    let latency = latency.max(1);
    let buffer = AudioBuffer::<T>::new(frame_samples, channels);
    let frame_len = buffer.len();
    let (producer_tx, producer_rx) = sync_channel::<AudioBuffer<T>>(latency);
    let (consumer_tx, consumer_rx) = sync_channel::<AudioBuffer<T>>(latency);
    // the receivers are alive and the channels have room for latency buffers
    for _ in 1..latency {
        let _ = consumer_tx.send(buffer.clone());
    }
    let _ = producer_tx.send(buffer.clone());
    let mut producer_buffer = buffer.clone();
    producer_buffer.clear();
    let producer = AudioFrameProducer { buffer: producer_buffer, frame_len, rx: producer_rx, consumer_tx };
    let consumer = AudioFrameConsumer { buffer, cursor: 0, producer_tx, rx: consumer_rx };
    (producer, consumer)
}

impl<T> AudioFrameConsumer<T> {
    /// Rewinds the cursor to the beginning of the current frame.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }
    /// Exposes current frame as a slice.
    #[inline]
    pub fn current_frame(&self) -> &[T] {
        &self.buffer
    }
    /// Attempts to receive the next frame without blocking.
    ///
    /// On `Ok(true)` replaces the current frame with the new one and sends back the old one.
    /// If there is no frame waiting returns `Ok(false)`.
    /// Returns `Err(AudioFrameError)` only when the producer has been dropped.
    pub fn next_frame(&mut self) -> AudioFrameResult<bool> {
        match self.rx.try_recv() {
            Ok(mut buffer) => {
                swap(&mut self.buffer, &mut buffer);
                self.producer_tx.send(buffer)?;
                Ok(true)
            }
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => Err(AudioFrameError),
        }
    }
}

impl<T: Copy> AudioFrameConsumer<T> {
    /// Fills `target_buffer` with the received audio frames until the whole buffer is filled
    /// or there is no frame waiting.
    ///
    /// On success returns the unfilled part of the target buffer in case there was a missing frame
    /// and `ignore_missing` was `false`. If the whole buffer has been filled returns an empty slice.
    /// In case `ignore_missing` is `true` the last audio frame is rendered again.
    ///
    /// Returns `Err(AudioFrameError)` only when the producer has been dropped.
    pub fn fill_buffer<'a>(&mut self, mut target_buffer: &'a mut [T],
                                      ignore_missing: bool) -> AudioFrameResult<&'a mut [T]> {
        let mut cursor = self.cursor;
        while !target_buffer.is_empty() {
            if cursor >= self.buffer.len() {
                if !(self.next_frame()? || ignore_missing) || self.buffer.is_empty() {
                    break
                }
                cursor = 0;
            }
            let copied_size = self.buffer.copy_to(target_buffer, cursor);
            cursor += copied_size;
            target_buffer = &mut target_buffer[copied_size..];
        }
        self.cursor = cursor;
        Ok(target_buffer)
    }
}

impl<T> AudioFrameProducer<T> {
    /// Returns the number of samples buffered and not yet sent.
    pub fn pending_samples(&self) -> usize {
        self.buffer.len()
    }
    /// Returns the number of interleaved samples in a full frame.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
    /// Sends the current frame to the consumer, waiting for an empty buffer to come back first.
    ///
    /// Returns `Err(AudioFrameError)` only when the consumer has been dropped.
    pub fn send_frame(&mut self) -> AudioFrameResult<()> {
        let buffer = replace(&mut self.buffer, self.rx.recv()?);
        self.buffer.clear();
        self.consumer_tx.send(buffer).map_err(From::from)
    }
}

impl<T: AudioSample + FromSample<i16>> AudioSink for AudioFrameProducer<T> {
    fn write_samples(&mut self, mut samples: &[i16]) -> io::Result<()> {
        while !samples.is_empty() {
            let room = self.frame_len.saturating_sub(self.buffer.len()).max(1);
            let (head, rest) = samples.split_at(room.min(samples.len()));
            self.buffer.extend(head.iter().map(|&sample| T::from_sample(sample)));
            samples = rest;
            if self.buffer.len() >= self.frame_len {
                self.send_frame()?;
            }
        }
        Ok(())
    }

    fn flush_samples(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            trace!("flushing {} samples", self.buffer.len());
            self.send_frame()?;
        }
        Ok(())
    }
}
