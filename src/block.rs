/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Data bytes encoding.
use std::sync::Arc;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use crate::audio::AudioSink;
use crate::player::{Break, TapeSession, Flow};

/// The number of bits in a fully used byte.
pub const FULL_BYTE_BITS: u8 = 8;

impl<S: AudioSink> TapeSession<S> {
    /// Sets how many of the most significant bits of the last byte of a block are played.
    ///
    /// The value applies to the final data part played next and reverts to 8 afterwards.
    /// Values above 8 are clamped.
    pub fn set_last_byte_bits(&mut self, bits: u8) {
        if bits > FULL_BYTE_BITS {
            warn!("used bits in the last byte: {} clamped to {}", bits, FULL_BYTE_BITS);
        }
        self.last_byte_bits = bits.min(FULL_BYTE_BITS);
    }
    /// Returns the number of bits played from the last byte of the next final data part.
    pub fn last_byte_bits(&self) -> u8 {
        self.last_byte_bits
    }
    /// Renders `data` as bits, the most significant bit first.
    ///
    /// If `is_final_part` is `true` only the number of bits given by [TapeSession::last_byte_bits]
    /// are played from the last byte.
    pub(crate) fn send_block(&mut self, data: &[u8], is_final_part: bool) -> Flow {
        if data.is_empty() {
            return Ok(())
        }
        if self.state.is_halted() {
            return Err(Break::Halt)
        }
        let control = Arc::clone(&self.control);
        let progress = &control.progress;
        let last = data.len() - 1;
        progress.begin_block();
        for (index, &byte) in data.iter().enumerate() {
            progress.enter_byte(index, data.len());
            self.checkpoint()?;
            let bits = if is_final_part && index == last {
                self.last_byte_bits
            }
            else {
                FULL_BYTE_BITS
            };
            self.send_byte(byte, bits)?;
            progress.byte_loaded();
        }
        progress.end_block();
        if is_final_part {
            self.last_byte_bits = FULL_BYTE_BITS;
        }
        Ok(())
    }

    fn send_byte(&mut self, byte: u8, bits: u8) -> Flow {
        for n in 0..bits.min(FULL_BYTE_BITS) {
            self.bit_tone(byte & (0x80 >> n) != 0)?;
        }
        Ok(())
    }
}
