//! Push-button press classification.
//!
//! Short presses step the volume, long holds shut down. Presses shorter than
//! the bounce window or between the two bands are ignored so a hesitant
//! press triggers neither action.

use embassy_time::{Duration, Instant};

use crate::bus::{Bus, Events};

pub const STEP_MIN: Duration = Duration::from_millis(50);
pub const STEP_MAX: Duration = Duration::from_millis(1000);
pub const SHUTDOWN_MIN: Duration = Duration::from_millis(3000);
/// Quiet time after a classified release.
pub const HOLDOFF: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    StepVolume,
    Shutdown,
}

impl ButtonAction {
    pub fn event(self) -> Events {
        match self {
            ButtonAction::StepVolume => Events::STEP_VOLUME,
            ButtonAction::Shutdown => Events::SHUTDOWN,
        }
    }
}

pub fn classify(press: Duration) -> Option<ButtonAction> {
    if press >= SHUTDOWN_MIN {
        Some(ButtonAction::Shutdown)
    } else if press >= STEP_MIN && press < STEP_MAX {
        Some(ButtonAction::StepVolume)
    } else {
        None
    }
}

/// Press/release edge bookkeeping.
#[derive(Default)]
pub struct PressTimer {
    pressed_at: Option<Instant>,
}

impl PressTimer {
    pub const fn new() -> Self {
        Self { pressed_at: None }
    }

    pub fn press(&mut self, now: Instant) {
        self.pressed_at = Some(now);
    }

    /// Press length, or `None` for a release without a recorded press.
    pub fn release(&mut self, now: Instant) -> Option<Duration> {
        let start = self.pressed_at.take()?;
        now.checked_duration_since(start)
    }
}

/// Classifies a completed press and forwards the action to the beeper.
pub fn dispatch(press: Duration, bus: &Bus) -> Option<ButtonAction> {
    let action = classify(press);
    match action {
        Some(a) => {
            info!("button: {} after {} ms", a, press.as_millis());
            bus.beeper.raise(a.event());
        }
        None => debug!("button: ignored {} ms press", press.as_millis()),
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn boundaries() {
        let got = [49, 50, 999, 1000, 2999, 3000].map(|v| classify(ms(v)));
        assert_eq!(
            got,
            [
                None,
                Some(ButtonAction::StepVolume),
                Some(ButtonAction::StepVolume),
                None,
                None,
                Some(ButtonAction::Shutdown),
            ]
        );
    }

    #[test]
    fn very_long_hold_is_shutdown() {
        assert_eq!(classify(ms(60_000)), Some(ButtonAction::Shutdown));
        assert_eq!(classify(ms(0)), None);
    }

    #[test]
    fn press_timer_measures_edges() {
        let mut t = PressTimer::new();
        assert_eq!(t.release(Instant::from_millis(10)), None);

        t.press(Instant::from_millis(1_000));
        assert_eq!(t.release(Instant::from_millis(1_120)), Some(ms(120)));
        assert_eq!(t.release(Instant::from_millis(1_200)), None);
    }

    #[test]
    fn dispatch_raises_beeper_event() {
        let bus = Bus::new();
        assert_eq!(dispatch(ms(200), &bus), Some(ButtonAction::StepVolume));
        assert_eq!(dispatch(ms(1_500), &bus), None);
        assert_eq!(bus.beeper.take(), Events::STEP_VOLUME);

        dispatch(ms(3_200), &bus);
        assert_eq!(bus.beeper.take(), Events::SHUTDOWN);
    }
}
