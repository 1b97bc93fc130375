//! Tick-driven playback state machine
//!
//! The engine walks a pattern one bit per tick, most-significant byte first
//! and most-significant bit first within each byte. Each repetition starts
//! again at the highest set bit, so leading zeros never cost a tick.

use crate::output::Level;
use crate::pattern::Request;

/// Position of the next bit to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor {
    /// Byte of the pattern, 3 is the most significant.
    pub byte: u8,
    /// Single-bit mask within that byte.
    pub mask: u8,
}

impl Cursor {
    /// Cursor on the highest set bit, `None` for an all-zero pattern.
    pub fn locate(pattern: u32) -> Option<Self> {
        let bytes = pattern.to_le_bytes();
        let byte = (0..bytes.len()).rev().find(|&i| bytes[i] != 0)?;
        let mask = 0x80 >> bytes[byte].leading_zeros();
        Some(Self {
            byte: byte as u8,
            mask,
        })
    }

    pub fn is_set(self, pattern: u32) -> bool {
        pattern.to_le_bytes()[self.byte as usize] & self.mask != 0
    }

    /// The next bit toward bit 0, `None` once bit 0 has been played.
    pub fn advance(self) -> Option<Self> {
        match (self.mask >> 1, self.byte) {
            (0, 0) => None,
            (0, byte) => Some(Self {
                byte: byte - 1,
                mask: 0x80,
            }),
            (mask, byte) => Some(Self { byte, mask }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing {
        pattern: u32,
        /// Always nonzero while playing.
        remaining: u8,
        /// `None` until the first tick of each repetition locates the start.
        cursor: Option<Cursor>,
    },
}

impl PlaybackState {
    /// State right after loading `request`; silent or empty requests stay idle.
    pub fn load(request: Request) -> Self {
        if request.is_empty() || request.is_silent() {
            return Self::Idle;
        }

        Self::Playing {
            pattern: request.pattern,
            remaining: request.repetitions,
            cursor: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Repetitions left, counting the one in progress.
    pub fn remaining(&self) -> u8 {
        match *self {
            Self::Idle => 0,
            Self::Playing { remaining, .. } => remaining,
        }
    }

    /// Advances playback by one tick.
    ///
    /// `pending` is only called when the engine is idle, so a request waiting
    /// behind a playing pattern stays where it is. Returns the next state and
    /// the level to drive for this tick.
    pub fn step(self, pending: impl FnOnce() -> Option<Request>) -> (Self, Level) {
        let state = match self {
            Self::Idle => pending().map_or(Self::Idle, Self::load),
            playing => playing,
        };

        let Self::Playing {
            pattern,
            remaining,
            cursor,
        } = state
        else {
            return (Self::Idle, Level::Off);
        };

        let (cursor, level) = match cursor {
            Some(cursor) => (cursor, Level::from(cursor.is_set(pattern))),
            // the highest set bit is set by construction
            None => match Cursor::locate(pattern) {
                Some(cursor) => (cursor, Level::On),
                None => return (Self::Idle, Level::Off),
            },
        };

        let next = match cursor.advance() {
            Some(cursor) => Self::Playing {
                pattern,
                remaining,
                cursor: Some(cursor),
            },
            None if remaining > 1 => Self::Playing {
                pattern,
                remaining: remaining - 1,
                cursor: None,
            },
            None => Self::Idle,
        };

        (next, level)
    }
}
