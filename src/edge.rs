/*
    Copyright (C) 2020-2023  Rafal Michalski

    This file is part of EARPULSE, a Rust library for synthesizing ZX Spectrum tape signals.

    For the full copyright notice, see the lib.rs file.
*/
//! Square-wave edge polarity.
use crate::config::{OutputFlags, TapeConfig};

/// The logical level the output line currently rests at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Up,
    Down
}

impl Default for Edge {
    fn default() -> Self {
        Edge::Down
    }
}

impl Edge {
    /// Returns the opposite level.
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Edge::Up => Edge::Down,
            Edge::Down => Edge::Up
        }
    }
    #[inline]
    pub fn is_up(self) -> bool {
        self == Edge::Up
    }
    #[inline]
    pub fn is_down(self) -> bool {
        self == Edge::Down
    }
    /// Commits the level of the next semi-pulse and returns it.
    ///
    /// With `change_edge` the level flips, otherwise the pulse continues at the resting level.
    /// Either way the resting level equals the returned one afterwards, so the following
    /// edge-changing pulse always alternates.
    #[inline]
    pub fn advance(&mut self, change_edge: bool) -> Edge {
        if change_edge {
            *self = self.flipped();
        }
        *self
    }
    /// Returns the amplitude representing this level with the given configuration, before volume scaling.
    pub fn amplitude(self, config: &TapeConfig) -> i16 {
        let high = self.is_up() != config.flags.contains(OutputFlags::INVERSE_POLARITY);
        if high {
            config.level_high
        }
        else if config.flags.contains(OutputFlags::ZERO_LEVEL) {
            0
        }
        else {
            config.level_low
        }
    }
}

/// Scales `amplitude` by `volume` percent.
#[inline]
pub fn scale_volume(amplitude: i16, volume: u8) -> i16 {
    (amplitude as i32 * volume.min(100) as i32 / 100) as i16
}
