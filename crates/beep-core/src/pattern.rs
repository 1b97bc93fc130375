//! Beep request encoding
//!
//! Every request is squeezed into a 32-bit pattern plus a repetition count.
//! Bit `i` of the pattern is one tick of output (1/16 s at the nominal rate),
//! set bits sound and clear bits are silent. Leading zeros are skipped by the
//! player, so `0b101` and `0b1010_0000_0000` start sounding on the same tick.

use crate::consts::{PATTERN_BITS, TICK_RATE_HZ};

/// A pattern and how many times to play it.
///
/// A request with zero repetitions is empty; a request with a zero pattern is
/// silent. Either one is a no-op once it reaches the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request {
    pub pattern: u32,
    pub repetitions: u8,
}

impl Request {
    /// The empty request; posting it clears whatever was pending.
    pub const NONE: Self = Self::new(0, 0);

    pub const fn new(pattern: u32, repetitions: u8) -> Self {
        Self {
            pattern,
            repetitions,
        }
    }

    /// A single beep of `duration_ms`.
    ///
    /// Durations past [`MAX_BEEP_MS`](crate::consts::MAX_BEEP_MS) saturate to a
    /// full pattern. Durations under one tick produce a silent request.
    pub const fn beep(duration_ms: u16) -> Self {
        Self::new(low_bits(ticks_for(duration_ms)), 1)
    }

    /// `n` beeps of `duration_ms`, each followed by the same length of silence.
    ///
    /// The beep occupies the upper half of a `2 * ticks` wide window and the
    /// silence the lower half, since playback runs from the high bit down.
    /// One cycle is encoded and replayed `n` times, so each phase
    /// saturates at half the pattern width
    /// ([`MAX_BEEP_TIMES_MS`](crate::consts::MAX_BEEP_TIMES_MS)).
    pub const fn beep_times(n: u8, duration_ms: u16) -> Self {
        let mut ticks = ticks_for(duration_ms);
        if ticks > PATTERN_BITS / 2 {
            ticks = PATTERN_BITS / 2;
        }
        Self::new(low_bits(2 * ticks) ^ low_bits(ticks), n)
    }

    /// A raw pattern, played once.
    pub const fn pattern(bits: u32) -> Self {
        Self::new(bits, 1)
    }

    pub const fn is_empty(&self) -> bool {
        self.repetitions == 0
    }

    pub const fn is_silent(&self) -> bool {
        self.pattern == 0
    }

    /// Ticks one repetition lasts, counted from the highest set bit down to bit 0.
    pub const fn pattern_len(&self) -> u32 {
        PATTERN_BITS - self.pattern.leading_zeros()
    }

    /// Ticks the whole request keeps the player busy.
    pub const fn total_ticks(&self) -> u32 {
        self.pattern_len() * self.repetitions as u32
    }
}

/// Whole ticks covered by `duration_ms`, rounded down.
pub const fn ticks_for(duration_ms: u16) -> u32 {
    duration_ms as u32 * TICK_RATE_HZ / 1000
}

/// `ticks` consecutive set bits starting at bit 0, saturating at the full width.
const fn low_bits(ticks: u32) -> u32 {
    if ticks >= PATTERN_BITS {
        u32::MAX
    } else {
        (1 << ticks) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_BEEP_MS, MAX_BEEP_TIMES_MS};
    use rand::{Rng, SeedableRng, rngs::SmallRng};

    #[test]
    fn test_beep_sets_contiguous_low_bits() {
        for ms in 0..=MAX_BEEP_MS {
            let ticks = (ms as u32 * 16) / 1000;
            let request = Request::beep(ms);

            assert_eq!(request.repetitions, 1);
            assert_eq!(request.pattern.count_ones(), ticks, "duration {ms}");
            assert_eq!(request.pattern.trailing_ones(), ticks, "duration {ms}");
        }
    }

    #[test]
    fn test_beep_125ms_is_two_ticks() {
        assert_eq!(Request::beep(125), Request::new(0b11, 1));
    }

    #[test]
    fn test_beep_saturates_past_pattern_width() {
        assert_eq!(Request::beep(MAX_BEEP_MS).pattern, u32::MAX);
        assert_eq!(Request::beep(2500).pattern, u32::MAX);
        assert_eq!(Request::beep(u16::MAX).pattern, u32::MAX);
    }

    #[test]
    fn test_beep_shorter_than_a_tick_is_silent() {
        assert!(Request::beep(0).is_silent());
        assert!(Request::beep(62).is_silent());
        assert_eq!(Request::beep(63).pattern, 0b1);
    }

    #[test]
    fn test_beep_times_one_cycle() {
        let mut rng = SmallRng::seed_from_u64(2137);

        for ms in 63..=MAX_BEEP_TIMES_MS {
            let n: u8 = rng.random();
            let ticks = (ms as u32 * 16) / 1000;
            let request = Request::beep_times(n, ms);

            assert_eq!(request.repetitions, n);
            assert_eq!(request.pattern_len(), 2 * ticks, "duration {ms}");
            // sounding half played first, silent half after it
            assert_eq!(request.pattern.count_ones(), ticks, "duration {ms}");
            assert_eq!(request.pattern.trailing_zeros(), ticks, "duration {ms}");
        }
    }

    #[test]
    fn test_beep_times_250ms() {
        let request = Request::beep_times(3, 250);
        assert_eq!(request.pattern, 0b1111_0000);
        assert_eq!(request.repetitions, 3);
        assert_eq!(request.total_ticks(), 24);
    }

    #[test]
    fn test_beep_times_shorter_than_a_tick_is_silent() {
        assert!(Request::beep_times(5, 50).is_silent());
    }

    #[test]
    fn test_beep_times_saturates_at_half_width() {
        assert_eq!(Request::beep_times(2, MAX_BEEP_TIMES_MS).pattern, 0xFFFF_0000);
        assert_eq!(Request::beep_times(2, 1500).pattern, 0xFFFF_0000);
    }

    #[test]
    fn test_raw_pattern_passes_through() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..256 {
            let bits: u32 = rng.random();
            assert_eq!(Request::pattern(bits), Request::new(bits, 1));
        }
    }

    #[test]
    fn test_pattern_len_ignores_leading_zeros() {
        assert_eq!(Request::pattern(0).pattern_len(), 0);
        assert_eq!(Request::pattern(0b101).pattern_len(), 3);
        assert_eq!(Request::pattern(0x500).pattern_len(), 11);
        assert_eq!(Request::pattern(u32::MAX).pattern_len(), 32);
        assert_eq!(Request::new(0b101, 4).total_ticks(), 12);
    }
}
