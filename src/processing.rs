//! Pressure samples in, climb rate out.
//!
//! Each sample runs through an alpha-beta filter, is converted to pressure
//! altitude and appended to a sliding window. Once the window is full every
//! sample yields a least-squares climb rate over the whole window.

use crate::bus::{Bus, SampleLink};
use crate::config::{SignalConfig, HISTORY_LEN};
use crate::drivers::filter::{AlphaBetaFilter, FilterState};
use crate::state::{RawSample, SignalSnapshot};
use crate::ticks::{elapsed_ticks, ticks_to_secs, Tick};

/// ISA sea-level pressure, Pa.
pub const SEA_LEVEL_PA: f32 = 101_325.0;

/// Standard barometric formula, Pa -> m.
pub fn pressure_to_altitude(pressure: f32) -> f32 {
    44_330.0 * (1.0 - libm::powf(pressure / SEA_LEVEL_PA, 0.1902))
}

// ── Altitude window ───────────────────────────────────────────────────────────

/// Fixed-capacity ring of altitudes.
///
/// Not eligible for slope computation until `N` values have been written;
/// after that every push overwrites the oldest entry.
pub struct AltitudeHistory<const N: usize> {
    buf: [f32; N],
    filled: usize,
    cursor: usize,
}

impl<const N: usize> AltitudeHistory<N> {
    pub const fn new() -> Self {
        Self { buf: [0.0; N], filled: 0, cursor: 0 }
    }

    pub fn push(&mut self, altitude: f32) {
        self.buf[self.cursor] = altitude;
        self.cursor = (self.cursor + 1) % N;
        if self.filled < N {
            self.filled += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == N
    }

    /// Stored values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.is_full() { self.cursor } else { 0 };
        (0..self.filled).map(move |i| self.buf[(start + i) % N])
    }

    /// Least-squares slope of the stored values against `i * dt`.
    ///
    /// `None` until the window is full or when `dt` is not positive.
    pub fn slope(&self, dt: f32) -> Option<f32> {
        if !self.is_full() || !(dt > 0.0) {
            return None;
        }

        let n = N as f32;
        let mut x_avg = 0.0;
        let mut y_avg = 0.0;
        for (i, y) in self.iter().enumerate() {
            x_avg += i as f32 * dt;
            y_avg += y;
        }
        x_avg /= n;
        y_avg /= n;

        let mut num = 0.0;
        let mut den = 0.0;
        for (i, y) in self.iter().enumerate() {
            let dx = i as f32 * dt - x_avg;
            num += dx * (y - y_avg);
            den += dx * dx;
        }

        if den > 0.0 {
            Some(num / den)
        } else {
            None
        }
    }
}

impl<const N: usize> Default for AltitudeHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// What the engine did with one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    /// First sample: filter seeded, nothing else.
    Seeded,
    /// Timestamp did not advance; sample dropped, state untouched.
    Skipped,
    /// Window still filling.
    WarmingUp { filled: usize },
    Ready(SignalSnapshot),
}

pub struct VarioEngine {
    config: SignalConfig,
    filter: AlphaBetaFilter,
    history: AltitudeHistory<HISTORY_LEN>,
    last_timestamp: Option<Tick>,
}

impl VarioEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            filter: AlphaBetaFilter::new(config.alpha, config.beta),
            history: AltitudeHistory::new(),
            last_timestamp: None,
            config,
        }
    }

    /// Runs one sample through the pipeline; `Some` once the window is full.
    pub fn process(&mut self, sample: RawSample) -> Option<SignalSnapshot> {
        match self.step(sample) {
            SampleOutcome::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn step(&mut self, sample: RawSample) -> SampleOutcome {
        let Some(prev) = self.last_timestamp else {
            self.filter.init(sample.pressure as f32);
            self.last_timestamp = Some(sample.timestamp);
            debug!("signal: seeded at {} Pa", sample.pressure);
            return SampleOutcome::Seeded;
        };

        let Some(ticks) = elapsed_ticks(prev, sample.timestamp) else {
            warn!("signal: skipped sample, timestamp {} -> {}", prev, sample.timestamp);
            return SampleOutcome::Skipped;
        };
        let dt = ticks_to_secs(ticks, self.config.tick_hz);

        let Some(filtered_pressure) = self.filter.filter(sample.pressure as f32, dt) else {
            return SampleOutcome::Skipped;
        };
        self.last_timestamp = Some(sample.timestamp);

        let altitude = pressure_to_altitude(filtered_pressure);
        let was_full = self.history.is_full();
        self.history.push(altitude);

        let Some(vario) = self.history.slope(dt) else {
            return SampleOutcome::WarmingUp { filled: self.history.len() };
        };
        if !was_full {
            info!("signal: window full, vario {} m/s", vario);
        }

        SampleOutcome::Ready(SignalSnapshot {
            vario,
            baro_altitude: altitude,
            filtered_pressure,
        })
    }

    pub fn filter_state(&self) -> FilterState {
        self.filter.state()
    }

    pub fn history(&self) -> &AltitudeHistory<HISTORY_LEN> {
        &self.history
    }
}

/// Engine loop: takes each sample off the hand-off link and publishes results.
pub async fn run(mut engine: VarioEngine, link: &SampleLink, bus: &Bus) -> ! {
    loop {
        let sample = link.receive().await;
        if let Some(snapshot) = engine.process(sample) {
            bus.publish(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn altitude_formula_reference_points() {
        assert!(pressure_to_altitude(SEA_LEVEL_PA).abs() < 1e-3);
        // ISA: 89875 Pa is about 1000 m
        let h = pressure_to_altitude(89_875.0);
        assert!((h - 1000.0).abs() < 5.0, "got {h}");
        assert!(pressure_to_altitude(90_000.0) > pressure_to_altitude(95_000.0));
    }

    #[test]
    fn history_iterates_oldest_first_after_wrap() {
        let mut h = AltitudeHistory::<4>::new();
        for v in 1..=6 {
            h.push(v as f32);
        }
        assert!(h.is_full());
        let got: [f32; 4] = core::array::from_fn(|i| h.iter().nth(i).unwrap());
        assert_eq!(got, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn history_not_full_until_capacity() {
        let mut h = AltitudeHistory::<4>::new();
        assert!(h.is_empty());
        for v in 0..3 {
            h.push(v as f32);
            assert!(!h.is_full());
            assert_eq!(h.slope(0.1), None);
        }
        h.push(3.0);
        assert!(h.is_full());
        assert_eq!(h.len(), 4);
    }

    #[test]
    fn slope_of_wrapped_ramp() {
        let mut h = AltitudeHistory::<10>::new();
        // 2.5 m/s at 0.2 s spacing, pushed past capacity so the ring wraps.
        for i in 0..27 {
            h.push(300.0 + 2.5 * 0.2 * i as f32);
        }
        let s = h.slope(0.2).unwrap();
        assert!((s - 2.5).abs() < 1e-3, "slope {s}");
    }

    #[test]
    fn seed_then_skip_on_stale_timestamp() {
        let mut engine = VarioEngine::new(SignalConfig::with_tick_hz(1_000));
        let s = |timestamp, pressure| RawSample { timestamp, pressure, temperature: 2000 };

        assert_eq!(engine.step(s(100, 95_000)), SampleOutcome::Seeded);
        assert_eq!(engine.step(s(120, 95_010)), SampleOutcome::WarmingUp { filled: 1 });
        let before = engine.filter_state();

        assert_eq!(engine.step(s(120, 99_999)), SampleOutcome::Skipped);
        assert_eq!(engine.step(s(110, 99_999)), SampleOutcome::Skipped);
        assert_eq!(engine.filter_state(), before);
        assert_eq!(engine.history().len(), 1);

        assert_eq!(engine.step(s(140, 95_020)), SampleOutcome::WarmingUp { filled: 2 });
    }
}
