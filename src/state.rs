//! Shared data types passed between the sample source, the signal engine and
//! the consumers of its output.
//!
//! All types are `Copy` so they can move through channels and mutex cells by value.

use crate::ticks::Tick;

// ── Inbound ───────────────────────────────────────────────────────────────────

/// One temperature-compensated reading, stamped when the conversion finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub timestamp: Tick,
    /// Pascals.
    pub pressure: u32,
    /// Hundredths of a degree Celsius.
    pub temperature: i32,
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Latest engine output. Zeroed until the altitude window has filled.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalSnapshot {
    /// Climb rate, m/s (negative = sink).
    pub vario: f32,
    /// Pressure altitude, m.
    pub baro_altitude: f32,
    /// Pa.
    pub filtered_pressure: f32,
}
