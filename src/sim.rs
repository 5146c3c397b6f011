//! Synthetic climb-rate source for exercising the audio path on the bench.

use embassy_time::{Duration, Timer};

use crate::bus::Bus;
use crate::state::SignalSnapshot;

pub const SWEEP_TOP: f32 = 7.0;
pub const SWEEP_BOTTOM: f32 = -6.0;
pub const SWEEP_STEP: f32 = 0.01;
pub const SWEEP_PERIOD: Duration = Duration::from_millis(20);

/// Endless triangle: 0 up to [`SWEEP_TOP`], down to [`SWEEP_BOTTOM`], repeat.
pub struct VarioSweep {
    value: f32,
    rising: bool,
}

impl VarioSweep {
    pub const fn new() -> Self {
        Self { value: 0.0, rising: true }
    }
}

impl Default for VarioSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for VarioSweep {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.rising && self.value >= SWEEP_TOP {
            self.rising = false;
        } else if !self.rising && self.value <= SWEEP_BOTTOM {
            self.rising = true;
        }

        if self.rising {
            self.value += SWEEP_STEP;
        } else {
            self.value -= SWEEP_STEP;
        }
        Some(self.value)
    }
}

/// Publishes the sweep in place of the engine.
pub async fn run(bus: &Bus) -> ! {
    info!("sim: vario sweep");
    let mut sweep = VarioSweep::new();
    loop {
        let vario = sweep.next().unwrap_or_default();
        bus.publish(SignalSnapshot { vario, ..SignalSnapshot::default() });
        Timer::after(SWEEP_PERIOD).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_turns_at_both_ends() {
        let values: std::vec::Vec<f32> = VarioSweep::new().take(3_000).collect();

        let max = values.iter().cloned().fold(f32::MIN, f32::max);
        let min = values.iter().cloned().fold(f32::MAX, f32::min);
        assert!(max >= SWEEP_TOP && max < SWEEP_TOP + 2.0 * SWEEP_STEP, "max {max}");
        assert!(min <= SWEEP_BOTTOM && min > SWEEP_BOTTOM - 2.0 * SWEEP_STEP, "min {min}");

        assert!((values[0] - SWEEP_STEP).abs() < 1e-6);
        for w in values.windows(2) {
            assert!(((w[1] - w[0]).abs() - SWEEP_STEP).abs() < 1e-3);
        }
    }
}
