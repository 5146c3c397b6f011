//! Monotonic tick arithmetic for sample timestamps.
//!
//! Timestamps are the low 32 bits of the system tick counter, so they wrap.
//! Differences are taken modulo 2^32; a difference in the upper half of the
//! range is read as a timestamp that went backwards.

/// Sample timestamp in system ticks (wrapping).
pub type Tick = u32;

/// Largest forward step accepted between two timestamps.
pub const MAX_FORWARD_TICKS: u32 = u32::MAX / 2;

/// Ticks elapsed from `prev` to `now`, correct across counter wraparound.
///
/// Returns `None` when the timestamps are identical or `now` precedes `prev`.
pub fn elapsed_ticks(prev: Tick, now: Tick) -> Option<u32> {
    match now.wrapping_sub(prev) {
        0 => None,
        dt if dt > MAX_FORWARD_TICKS => None,
        dt => Some(dt),
    }
}

/// Converts a tick count to seconds.
pub fn ticks_to_secs(ticks: u32, tick_hz: u32) -> f32 {
    ticks as f32 / tick_hz as f32
}

/// Truncates an `embassy_time::Instant` to a sample timestamp.
pub fn tick_of(instant: embassy_time::Instant) -> Tick {
    instant.as_ticks() as Tick
}
