/// Rate the tick source is expected to call [`Player::tick`](crate::buzzer::Player::tick) at.
pub const TICK_RATE_HZ: u32 = 16;

/// Length of one tick in microseconds (62.5 ms at 16 Hz).
pub const TICK_PERIOD_US: u32 = 1_000_000 / TICK_RATE_HZ;

/// Width of a beep pattern; each bit is one tick.
pub const PATTERN_BITS: u32 = u32::BITS;

/// Longest single beep that fits in a pattern.
pub const MAX_BEEP_MS: u16 = (PATTERN_BITS * 1000 / TICK_RATE_HZ) as u16;

/// Longest beep (and matching silence) for a repeated cadence.
pub const MAX_BEEP_TIMES_MS: u16 = MAX_BEEP_MS / 2;
