//! Beeper state machine.
//!
//! `BeepMachine::handle` is a pure transition function: it updates the control,
//! tone and volume state and returns the hardware effects to perform, without
//! touching any hardware itself.
//!
//! Control states and their transitions (thresholds from [`BeepConfig`]):
//!
//! ```text
//! Disabled --vario > lift_threshold-------> Lifting   (start pulse train)
//! Disabled --vario < sink_threshold-------> Sinking   (start pulse train)
//! Lifting  --vario < lift_off_threshold---> Disabled  (silence)
//! Sinking  --vario > sink_off_threshold---> Disabled  (silence)
//! ```
//!
//! Invariant after every event: the tone is off whenever the control state is
//! `Disabled`.

use embassy_time::Duration;
use heapless::Vec;

use super::melody::{Note, SHUTDOWN, STARTUP, VOLUME_SET};
use super::tone::{self, Volume};
use crate::config::BeepConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    Disabled,
    Lifting,
    Sinking,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToneState {
    On,
    Off,
}

/// Inputs to the machine. Measurement-driven events carry the vario read from
/// the snapshot at the time they are handled.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeepEvent {
    Measurement { vario: f32 },
    TimerExpired { vario: f32 },
    StepVolume,
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    ArmTimer(Duration),
    CancelTimer,
    ToneOn { freq_hz: u32, volume: Volume },
    ToneOff,
    PlayMelody { notes: &'static [Note], volume: Volume },
    ShutdownComplete,
}

/// Upper bound of effects a single event produces.
pub const MAX_EFFECTS: usize = 4;

/// Effects of one event, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Effects(Vec<Effect, MAX_EFFECTS>);

impl Effects {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn push(&mut self, effect: Effect) {
        let pushed = self.0.push(effect);
        debug_assert!(pushed.is_ok(), "effect list overflow");
    }

    pub fn as_slice(&self) -> &[Effect] {
        &self.0
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Effect> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Effects {
    type Item = &'a Effect;
    type IntoIter = core::slice::Iter<'a, Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn millis(ms: u32) -> Duration {
    Duration::from_millis(ms as u64)
}

pub struct BeepMachine {
    config: BeepConfig,
    control: ControlState,
    tone: ToneState,
    volume: Volume,
    frequency: u32,
    halted: bool,
}

impl BeepMachine {
    pub fn new(config: BeepConfig) -> Self {
        Self::with_volume(config, Volume::default())
    }

    pub fn with_volume(config: BeepConfig, volume: Volume) -> Self {
        Self {
            config,
            control: ControlState::Disabled,
            tone: ToneState::Off,
            volume,
            frequency: 0,
            halted: false,
        }
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn tone(&self) -> ToneState {
        self.tone
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// True once a shutdown has been handled; every later event is ignored.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Melody that confirms the audio path at power-up.
    pub fn startup(&self) -> Effects {
        let mut fx = Effects::new();
        fx.push(Effect::PlayMelody { notes: STARTUP, volume: Volume::High });
        fx
    }

    pub fn handle(&mut self, event: BeepEvent) -> Effects {
        let mut fx = Effects::new();
        if self.halted {
            return fx;
        }

        match event {
            BeepEvent::Measurement { vario } => self.on_measurement(vario, &mut fx),
            BeepEvent::TimerExpired { vario } => self.on_timer(vario, &mut fx),
            BeepEvent::StepVolume => {
                self.force_disabled(&mut fx);
                self.volume = self.volume.next();
                info!("beep: volume {}", self.volume);
                fx.push(Effect::PlayMelody { notes: VOLUME_SET, volume: self.volume });
            }
            BeepEvent::Shutdown => {
                self.force_disabled(&mut fx);
                self.halted = true;
                info!("beep: shutdown");
                fx.push(Effect::PlayMelody { notes: SHUTDOWN, volume: Volume::High });
                fx.push(Effect::ShutdownComplete);
            }
        }
        fx
    }

    /// Hysteresis step only, without effects.
    pub fn next_control(&self, vario: f32) -> ControlState {
        let cfg = &self.config;
        match self.control {
            ControlState::Disabled if vario > cfg.lift_threshold => ControlState::Lifting,
            ControlState::Disabled if vario < cfg.sink_threshold => ControlState::Sinking,
            ControlState::Lifting if vario < cfg.lift_off_threshold => ControlState::Disabled,
            ControlState::Sinking if vario > cfg.sink_off_threshold => ControlState::Disabled,
            current => current,
        }
    }

    fn on_measurement(&mut self, vario: f32, fx: &mut Effects) {
        self.frequency = tone::frequency(&self.config, vario);
        let next = self.next_control(vario);

        match (self.control, next) {
            (ControlState::Disabled, ControlState::Disabled) => {}
            (ControlState::Disabled, _) => {
                debug!("beep: {} -> {} at {} m/s", self.control, next, vario);
                self.control = next;
                let beep = tone::beep_duration(&self.config, vario);
                fx.push(Effect::ArmTimer(millis(beep)));
                self.tone_on(fx);
            }
            (_, ControlState::Disabled) => {
                debug!("beep: {} -> Disabled at {} m/s", self.control, vario);
                self.control = ControlState::Disabled;
                fx.push(Effect::CancelTimer);
                self.tone_off(fx);
            }
            _ => {
                // Track the climb rate while audible.
                if self.tone == ToneState::On {
                    self.tone_on(fx);
                }
            }
        }
    }

    fn on_timer(&mut self, vario: f32, fx: &mut Effects) {
        if self.control == ControlState::Disabled {
            // Expiry raced a forced transition.
            self.tone_off(fx);
            return;
        }

        let silence = tone::silence_duration(&self.config, vario);
        let beep = tone::beep_duration(&self.config, vario);

        match self.tone {
            ToneState::On if silence == 0 => fx.push(Effect::ArmTimer(millis(beep))),
            ToneState::On => {
                self.tone_off(fx);
                fx.push(Effect::ArmTimer(millis(silence)));
            }
            ToneState::Off => {
                self.frequency = tone::frequency(&self.config, vario);
                self.tone_on(fx);
                fx.push(Effect::ArmTimer(millis(beep)));
            }
        }
    }

    fn force_disabled(&mut self, fx: &mut Effects) {
        fx.push(Effect::CancelTimer);
        self.control = ControlState::Disabled;
        self.tone_off(fx);
    }

    fn tone_on(&mut self, fx: &mut Effects) {
        self.tone = ToneState::On;
        fx.push(Effect::ToneOn { freq_hz: self.frequency, volume: self.volume });
    }

    fn tone_off(&mut self, fx: &mut Effects) {
        self.tone = ToneState::Off;
        fx.push(Effect::ToneOff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> BeepMachine {
        BeepMachine::new(BeepConfig::default())
    }

    fn measure(m: &mut BeepMachine, vario: f32) -> Effects {
        m.handle(BeepEvent::Measurement { vario })
    }

    #[test]
    fn quiet_inside_dead_band() {
        let mut m = machine();
        for v in [0.0, 0.5, -0.9, 0.6, -1.0] {
            assert!(measure(&mut m, v).is_empty());
            assert_eq!(m.control(), ControlState::Disabled);
        }
    }

    #[test]
    fn entering_lift_starts_pulse_train() {
        let mut m = machine();
        let fx = measure(&mut m, 3.0);
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::ArmTimer(Duration::from_millis(225)),
                Effect::ToneOn { freq_hz: 1050, volume: Volume::Medium },
            ]
        );
        assert_eq!(m.control(), ControlState::Lifting);
        assert_eq!(m.tone(), ToneState::On);
    }

    #[test]
    fn entering_sink_uses_sink_pitch() {
        let mut m = machine();
        let fx = measure(&mut m, -3.0);
        assert_eq!(m.control(), ControlState::Sinking);
        assert!(fx.iter().any(|e| *e == Effect::ToneOn { freq_hz: 275, volume: Volume::Medium }));
    }

    #[test]
    fn pitch_follows_vario_while_on() {
        let mut m = machine();
        measure(&mut m, 1.0);
        let fx = measure(&mut m, 3.0);
        assert_eq!(fx.as_slice(), &[Effect::ToneOn { freq_hz: 1050, volume: Volume::Medium }]);
    }

    #[test]
    fn no_reprogram_during_silence() {
        let mut m = machine();
        measure(&mut m, 3.0);
        m.handle(BeepEvent::TimerExpired { vario: 3.0 });
        assert_eq!(m.tone(), ToneState::Off);
        assert!(measure(&mut m, 3.5).is_empty());
    }

    #[test]
    fn leaving_lift_silences() {
        let mut m = machine();
        measure(&mut m, 1.0);
        let fx = measure(&mut m, 0.1);
        assert_eq!(fx.as_slice(), &[Effect::CancelTimer, Effect::ToneOff]);
        assert_eq!(m.control(), ControlState::Disabled);
        assert_eq!(m.tone(), ToneState::Off);
    }

    #[test]
    fn lift_pulse_alternates() {
        let mut m = machine();
        measure(&mut m, 3.0);

        let fx = m.handle(BeepEvent::TimerExpired { vario: 3.0 });
        assert_eq!(fx.as_slice(), &[Effect::ToneOff, Effect::ArmTimer(Duration::from_millis(145))]);

        let fx = m.handle(BeepEvent::TimerExpired { vario: 6.0 });
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::ToneOn { freq_hz: 1500, volume: Volume::Medium },
                Effect::ArmTimer(Duration::from_millis(100)),
            ]
        );
    }

    #[test]
    fn sink_tone_is_continuous() {
        let mut m = machine();
        measure(&mut m, -3.0);
        for _ in 0..3 {
            let fx = m.handle(BeepEvent::TimerExpired { vario: -3.0 });
            assert_eq!(fx.as_slice(), &[Effect::ArmTimer(Duration::from_millis(225))]);
            assert_eq!(m.tone(), ToneState::On);
        }
    }

    #[test]
    fn stale_expiry_after_forced_disable_is_noop() {
        let mut m = machine();
        measure(&mut m, 3.0);
        m.handle(BeepEvent::StepVolume);

        let fx = m.handle(BeepEvent::TimerExpired { vario: 3.0 });
        assert_eq!(fx.as_slice(), &[Effect::ToneOff]);
        assert_eq!(m.control(), ControlState::Disabled);
        assert_eq!(m.tone(), ToneState::Off);
    }

    #[test]
    fn step_volume_forces_disabled_and_confirms() {
        let mut m = machine();
        measure(&mut m, 3.0);
        let fx = m.handle(BeepEvent::StepVolume);
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::CancelTimer,
                Effect::ToneOff,
                Effect::PlayMelody { notes: VOLUME_SET, volume: Volume::High },
            ]
        );
        assert_eq!(m.volume(), Volume::High);
        assert_eq!(m.control(), ControlState::Disabled);
    }

    #[test]
    fn shutdown_halts_machine() {
        let mut m = machine();
        measure(&mut m, -3.0);
        let fx = m.handle(BeepEvent::Shutdown);
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::CancelTimer,
                Effect::ToneOff,
                Effect::PlayMelody { notes: SHUTDOWN, volume: Volume::High },
                Effect::ShutdownComplete,
            ]
        );
        assert!(m.is_halted());
        assert!(measure(&mut m, 5.0).is_empty());
        assert!(m.handle(BeepEvent::Shutdown).is_empty());
    }

    #[test]
    fn startup_melody_at_full_volume() {
        let m = machine();
        assert_eq!(
            m.startup().as_slice(),
            &[Effect::PlayMelody { notes: STARTUP, volume: Volume::High }]
        );
    }
}
