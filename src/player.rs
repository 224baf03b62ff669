/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! The tape playback session and the block player operations.
use std::io;
use std::sync::Arc;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::audio::AudioSink;
use crate::block::FULL_BYTE_BITS;
use crate::clock::{TStates, TimingConverter};
use crate::config::{ConfigError, TapeConfig};
use crate::control::{PlaybackState, TapeControl};
use crate::edge::Edge;
use crate::synth::{chunk_buffer, ErrorAccumulator};

/// The way a block player operation has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockOutcome {
    /// The whole block has been rendered.
    Completed,
    /// A stop request has been observed. Call [TapeSession::reset_playback] before playing again.
    Stopped,
    /// A pause request has been observed. Call [TapeSession::resume] to continue with the next block.
    Paused
}

impl BlockOutcome {
    #[inline]
    pub fn is_completed(self) -> bool {
        self == BlockOutcome::Completed
    }
}

/// The reason the rendering was interrupted.
#[derive(Debug)]
pub(crate) enum Break {
    /// A stop or a pause request has been observed.
    Halt,
    /// The audio sink has failed.
    Sink(io::Error)
}

impl From<io::Error> for Break {
    fn from(err: io::Error) -> Self {
        Break::Sink(err)
    }
}

pub(crate) type Flow = Result<(), Break>;

/// Renders tape blocks as stereo 16-bit PCM frames written to the audio sink `S`.
///
/// A session holds everything that persists between the rendered pulses: the edge polarity,
/// the owed samples, the playback state and the reusable chunk buffer.
#[derive(Debug)]
pub struct TapeSession<S> {
    pub(crate) config: TapeConfig,
    pub(crate) clock: TimingConverter,
    pub(crate) control: Arc<TapeControl>,
    pub(crate) state: PlaybackState,
    pub(crate) edge: Edge,
    pub(crate) owed: ErrorAccumulator,
    pub(crate) buffer: Vec<i16>,
    pub(crate) buffer_frame: Option<[i16; 2]>,
    pub(crate) last_amps: (i16, i16),
    pub(crate) last_byte_bits: u8,
    pub(crate) pause_ms: u32,
    pub(crate) sink: S,
}

impl<S: AudioSink> TapeSession<S> {
    /// Creates a new session with its own [TapeControl].
    pub fn new(config: TapeConfig, sink: S) -> Result<Self, ConfigError> {
        Self::with_control(config, sink, Arc::new(TapeControl::new()))
    }
    /// Creates a new session observing the requests of the given `control`.
    ///
    /// Returns an error if the `config` is invalid.
    pub fn with_control(
            config: TapeConfig,
            sink: S,
            control: Arc<TapeControl>
        ) -> Result<Self, ConfigError>
    {
        config.validate()?;
        let clock = TimingConverter::new(config.cpu_hz, config.sample_rate);
        let buffer = chunk_buffer(config.chunk_samples);
        let pause_ms = config.pause_ms;
        debug!("tape session: {} Hz, {} T-states/s, chunk: {}",
                config.sample_rate, config.cpu_hz, config.chunk_samples);
        Ok(TapeSession {
            config,
            clock,
            control,
            state: PlaybackState::default(),
            edge: Edge::default(),
            owed: ErrorAccumulator::default(),
            buffer,
            buffer_frame: None,
            last_amps: (0, 0),
            last_byte_bits: FULL_BYTE_BITS,
            pause_ms,
            sink
        })
    }

    pub fn config(&self) -> &TapeConfig {
        &self.config
    }

    pub fn clock(&self) -> &TimingConverter {
        &self.clock
    }
    /// Returns the shared control requests and progress counters.
    pub fn control(&self) -> &Arc<TapeControl> {
        &self.control
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }
    /// Returns the level the output line currently rests at.
    pub fn edge(&self) -> Edge {
        self.edge
    }

    pub fn sink_ref(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
    /// Returns the (right, left) channel amplitudes of the most recently rendered run.
    pub fn last_amplitudes(&self) -> (i16, i16) {
        self.last_amps
    }
    /// Returns the fraction of samples not yet rendered.
    pub fn owed_samples(&self) -> f64 {
        self.owed.owed()
    }
    /// Sets the trailing silence, in milliseconds, of the blocks played next.
    pub fn set_pause_ms(&mut self, millis: u32) {
        self.pause_ms = millis;
    }

    pub fn pause_ms(&self) -> u32 {
        self.pause_ms
    }
    /// Returns the session to the idle state after a stop.
    ///
    /// Withdraws pending requests, drops the owed samples and the last byte bits setting and
    /// brings the line down.
    pub fn reset_playback(&mut self) {
        debug!("reset playback from {:?}", self.state);
        self.control.clear_requests();
        self.state = PlaybackState::Idle;
        self.edge = Edge::default();
        self.owed.reset();
        self.last_byte_bits = FULL_BYTE_BITS;
    }
    /// Continues a paused session. The following block operations render again.
    ///
    /// Returns `false` if the session wasn't paused.
    pub fn resume(&mut self) -> bool {
        if self.state == PlaybackState::Pausing {
            debug!("resume playback");
            self.control.clear_requests();
            self.state = PlaybackState::Playing;
            true
        }
        else {
            false
        }
    }
    /// Flushes the audio sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush_samples()
    }

    /// Returns `true` if the rendering should halt, changing the state on the first observed request.
    ///
    /// An idle session renders unconditionally.
    pub(crate) fn should_abort(&mut self) -> bool {
        match self.state {
            PlaybackState::Idle => false,
            PlaybackState::Stopping|PlaybackState::Pausing => true,
            PlaybackState::Playing => {
                if self.control.is_stop_requested() {
                    info!("stop requested");
                    self.state = PlaybackState::Stopping;
                    true
                }
                else if self.control.is_pause_requested() {
                    info!("pause requested");
                    self.state = PlaybackState::Pausing;
                    true
                }
                else {
                    false
                }
            }
        }
    }

    #[inline]
    pub(crate) fn checkpoint(&mut self) -> Flow {
        if self.should_abort() {
            Err(Break::Halt)
        }
        else {
            Ok(())
        }
    }

    fn run<F>(&mut self, render: F) -> io::Result<BlockOutcome>
        where F: FnOnce(&mut Self) -> Flow
    {
        match self.state {
            PlaybackState::Idle => self.state = PlaybackState::Playing,
            PlaybackState::Playing => {}
            PlaybackState::Stopping => return Ok(BlockOutcome::Stopped),
            PlaybackState::Pausing => return Ok(BlockOutcome::Paused),
        }
        match self.checkpoint().and_then(|_| render(self)) {
            Ok(()) => Ok(BlockOutcome::Completed),
            Err(Break::Halt) if self.state == PlaybackState::Pausing => Ok(BlockOutcome::Paused),
            Err(Break::Halt) => Ok(BlockOutcome::Stopped),
            Err(Break::Sink(err)) => {
                error!("audio sink: {}", err);
                Err(err)
            }
        }
    }

    fn lead_and_syncs(&mut self, lead_width: TStates, lead_count: u32) -> Flow {
        self.pilot_tone(lead_width, lead_count)?;
        self.sync_pulse(self.config.sync_pulse1)?;
        self.sync_pulse(self.config.sync_pulse2)
    }
    /// Plays a complete block: the lead tone, both sync pulses, `data` and the trailing silence.
    pub fn play_standard_block(
            &mut self,
            data: &[u8],
            lead_width: TStates,
            lead_count: u32
        ) -> io::Result<BlockOutcome>
    {
        debug!("standard block: {} bytes, lead: {} x {}", data.len(), lead_count, lead_width);
        let pause_ms = self.pause_ms;
        self.run(|session| {
            session.lead_and_syncs(lead_width, lead_count)?;
            session.send_block(data, true)?;
            session.emit_silence(pause_ms)
        })
    }
    /// Plays a TAP block with the standard timings.
    ///
    /// The number of lead pulses is chosen by the flag byte: the first byte of `data`.
    pub fn play_tap_block(&mut self, data: &[u8]) -> io::Result<BlockOutcome> {
        let flag = match data.first() {
            Some(&flag) => flag,
            None => {
                debug!("empty tap block");
                return Ok(BlockOutcome::Completed)
            }
        };
        let lead_count = TapeConfig::lead_count_for_flag(flag);
        self.play_standard_block(data, self.config.lead_pulse, lead_count)
    }
    /// Plays `data` with no lead tone, followed by the trailing silence.
    pub fn play_raw_data(&mut self, data: &[u8]) -> io::Result<BlockOutcome> {
        debug!("raw data: {} bytes", data.len());
        let pause_ms = self.pause_ms;
        self.run(|session| {
            session.send_block(data, true)?;
            session.emit_silence(pause_ms)
        })
    }
    /// Plays `data` continuing a block split across several calls.
    pub fn play_data_fragment(&mut self, data: &[u8]) -> io::Result<BlockOutcome> {
        debug!("data fragment: {} bytes", data.len());
        self.run(|session| session.send_block(data, false))
    }
    /// Begins a block with the lead tone, both sync pulses and the first part of its data.
    ///
    /// Continue with [TapeSession::play_data_fragment] and finish with [TapeSession::play_block_trailer].
    pub fn play_block_header(
            &mut self,
            data: &[u8],
            lead_width: TStates,
            lead_count: u32
        ) -> io::Result<BlockOutcome>
    {
        debug!("block header: {} bytes, lead: {} x {}", data.len(), lead_count, lead_width);
        self.run(|session| {
            session.lead_and_syncs(lead_width, lead_count)?;
            session.send_block(data, false)
        })
    }
    /// Finishes a block with the last part of its data and the trailing silence.
    pub fn play_block_trailer(&mut self, data: &[u8]) -> io::Result<BlockOutcome> {
        debug!("block trailer: {} bytes", data.len());
        let pause_ms = self.pause_ms;
        self.run(|session| {
            session.send_block(data, true)?;
            session.emit_silence(pause_ms)
        })
    }
    /// Plays a sequence of semi-pulses, each changing the edge.
    pub fn play_raw_tone_sequence(&mut self, widths: &[TStates]) -> io::Result<BlockOutcome> {
        debug!("pulse sequence: {} pulses", widths.len());
        self.run(|session| {
            for &width in widths {
                session.emit_pulse(width, true)?;
            }
            Ok(())
        })
    }
    /// Plays `count` semi-pulses of `width` T-states with no sync pulses or data.
    pub fn play_pure_tone(&mut self, width: TStates, count: u32) -> io::Result<BlockOutcome> {
        debug!("pure tone: {} x {}", count, width);
        self.run(|session| session.pilot_tone(width, count))
    }
    /// Plays `millis` milliseconds of silence, preceded by a terminating pulse if needed.
    pub fn silence(&mut self, millis: u32) -> io::Result<BlockOutcome> {
        debug!("silence: {} ms", millis);
        self.run(|session| session.emit_silence(millis))
    }
    /// Plays the settling silence between blocks.
    pub fn end_of_block_gap(&mut self) -> io::Result<BlockOutcome> {
        let millis = self.config.end_gap_ms;
        debug!("end of block gap: {} ms", millis);
        self.run(|session| session.emit_silence(millis))
    }
}
