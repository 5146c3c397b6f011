use embassy_futures::select::{select, Either};

use super::machine::{BeepEvent, BeepMachine, Effect, Effects};
use super::melody;
use super::tone::Volume;
use crate::bus::{Bus, Events};
use crate::config::BeepConfig;

/// PWM tone generator.
pub trait ToneOutput {
    /// Starts (or retunes) the tone. Called on every tone-on and pitch update.
    fn tone(&mut self, freq_hz: u32, volume: Volume);
    fn mute(&mut self);
}

/// Runs the beeper state machine against the hardware.
///
/// Notifications and timer expiries are both handled on the controller's own
/// task, so control and tone state are never touched concurrently. A cancelled
/// timer that still manages to expire is absorbed by the machine's
/// `Disabled` check.
pub struct BeepController<'a, T: ToneOutput> {
    machine: BeepMachine,
    out: T,
    bus: &'a Bus,
}

impl<'a, T: ToneOutput> BeepController<'a, T> {
    pub fn new(config: BeepConfig, out: T, bus: &'a Bus) -> Self {
        Self { machine: BeepMachine::new(config), out, bus }
    }

    pub fn machine(&self) -> &BeepMachine {
        &self.machine
    }

    pub fn output(&self) -> &T {
        &self.out
    }

    /// Plays the power-up chirps.
    pub async fn start(&mut self) {
        self.out.mute();
        let fx = self.machine.startup();
        self.apply(&fx).await;
        info!("beep: ready");
    }

    /// Handles one wake-up worth of coalesced events.
    ///
    /// Button events go first so a result that arrived together with a
    /// shutdown is dropped.
    pub async fn on_events(&mut self, events: Events) {
        if events.contains(Events::STEP_VOLUME) {
            self.dispatch(BeepEvent::StepVolume).await;
        }
        if events.contains(Events::SHUTDOWN) {
            self.dispatch(BeepEvent::Shutdown).await;
        }
        if events.contains(Events::RESULT_READY) {
            let vario = self.bus.read_snapshot().vario;
            self.dispatch(BeepEvent::Measurement { vario }).await;
        }
    }

    /// Timer expiry: pulse parameters come from the snapshot current now,
    /// not the one the timer was armed with.
    pub async fn on_timer(&mut self) {
        let vario = self.bus.read_snapshot().vario;
        self.dispatch(BeepEvent::TimerExpired { vario }).await;
    }

    pub async fn dispatch(&mut self, event: BeepEvent) {
        let fx = self.machine.handle(event);
        self.apply(&fx).await;
    }

    async fn apply(&mut self, effects: &Effects) {
        for effect in effects {
            match *effect {
                Effect::ArmTimer(after) => self.bus.beep_timer.arm(after),
                Effect::CancelTimer => {
                    self.bus.beep_timer.cancel();
                }
                Effect::ToneOn { freq_hz, volume } => self.out.tone(freq_hz, volume),
                Effect::ToneOff => self.out.mute(),
                Effect::PlayMelody { notes, volume } => {
                    melody::play(&mut self.out, notes, volume).await
                }
                Effect::ShutdownComplete => self.bus.shutdown_complete.signal(()),
            }
        }
    }

    /// Startup melody, then events until shutdown.
    pub async fn run(&mut self) {
        self.start().await;
        while !self.machine.is_halted() {
            match select(self.bus.beeper.wait(), self.bus.beep_timer.expired()).await {
                Either::First(events) => self.on_events(events).await,
                Either::Second(()) => self.on_timer().await,
            }
        }
        info!("beep: stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beep::machine::{ControlState, ToneState};
    use crate::state::SignalSnapshot;
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_time::{Duration, Timer};
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Tone(u32, Volume),
        Mute,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl ToneOutput for Recorder {
        fn tone(&mut self, freq_hz: u32, volume: Volume) {
            self.calls.push(Call::Tone(freq_hz, volume));
        }

        fn mute(&mut self) {
            self.calls.push(Call::Mute);
        }
    }

    fn publish(bus: &Bus, vario: f32) {
        bus.publish(SignalSnapshot { vario, baro_altitude: 500.0, filtered_pressure: 95_461.0 });
    }

    #[test]
    fn result_ready_starts_tone_and_timer() {
        let bus = Bus::new();
        let mut ctl = BeepController::new(BeepConfig::default(), Recorder::default(), &bus);

        publish(&bus, 3.0);
        block_on(ctl.on_events(bus.beeper.take()));

        assert_eq!(ctl.output().calls, [Call::Tone(1050, Volume::Medium)]);
        assert!(bus.beep_timer.is_armed());
        assert_eq!(ctl.machine().control(), ControlState::Lifting);
    }

    #[test]
    fn expiry_uses_current_snapshot() {
        let bus = Bus::new();
        let mut ctl = BeepController::new(BeepConfig::default(), Recorder::default(), &bus);

        publish(&bus, 3.0);
        block_on(ctl.on_events(bus.beeper.take()));
        block_on(ctl.on_timer()); // tone off, silence
        publish(&bus, 6.0);
        bus.beeper.take();
        block_on(ctl.on_timer()); // tone on at the new pitch

        assert_eq!(
            ctl.output().calls,
            [Call::Tone(1050, Volume::Medium), Call::Mute, Call::Tone(1500, Volume::Medium)]
        );
    }

    #[test]
    fn volume_step_cancels_pulse_and_confirms() {
        let bus = Bus::new();
        let mut ctl = BeepController::new(BeepConfig::default(), Recorder::default(), &bus);

        publish(&bus, 3.0);
        block_on(ctl.on_events(bus.beeper.take()));
        block_on(ctl.on_events(Events::STEP_VOLUME));

        assert!(!bus.beep_timer.is_armed());
        assert_eq!(ctl.machine().volume(), Volume::High);
        assert_eq!(
            &ctl.output().calls[1..],
            &[Call::Mute, Call::Mute, Call::Tone(2000, Volume::High), Call::Mute, Call::Mute]
        );

        // An expiry that slipped past the cancel changes nothing audible.
        block_on(ctl.on_timer());
        assert_eq!(ctl.output().calls.last(), Some(&Call::Mute));
        assert_eq!(ctl.machine().tone(), ToneState::Off);
        assert!(!bus.beep_timer.is_armed());
    }

    #[test]
    fn shutdown_in_same_wakeup_drops_result() {
        let bus = Bus::new();
        let mut ctl = BeepController::new(BeepConfig::default(), Recorder::default(), &bus);

        publish(&bus, 3.0);
        block_on(ctl.on_events(bus.beeper.take() | Events::SHUTDOWN));

        assert!(ctl.machine().is_halted());
        assert_eq!(bus.shutdown_complete.try_take(), Some(()));
        assert!(!ctl.output().calls.contains(&Call::Tone(1050, Volume::Medium)));
    }

    #[test]
    fn run_exits_after_shutdown() {
        let bus = Bus::new();
        bus.beeper.raise(Events::SHUTDOWN);

        let mut ctl = BeepController::new(BeepConfig::default(), Recorder::default(), &bus);
        block_on(ctl.run());

        assert_eq!(bus.shutdown_complete.try_take(), Some(()));
    }

    #[test]
    fn run_pulses_from_timer_expiries() {
        let bus = Bus::new();
        let mut ctl = BeepController::new(BeepConfig::default(), Recorder::default(), &bus);

        // 3 m/s: 225 ms on, 145 ms off, so 1.2 s holds at least three pulses.
        let pilot = async {
            publish(&bus, 3.0);
            Timer::after(Duration::from_millis(1200)).await;
            bus.beeper.raise(Events::SHUTDOWN);
        };
        block_on(join(ctl.run(), pilot));

        let calls = &ctl.output().calls;
        let pulses = calls.iter().filter(|c| **c == Call::Tone(1050, Volume::Medium)).count();
        assert!(pulses >= 3, "{pulses} pulses in {calls:?}");

        // Every pulse is followed by a mute before the next one starts.
        let pulse_calls: Vec<_> = calls
            .iter()
            .copied()
            .skip_while(|c| *c != Call::Tone(1050, Volume::Medium))
            .take_while(|c| *c != Call::Tone(2000, Volume::High))
            .collect();
        for pair in pulse_calls.windows(2) {
            assert!(!(matches!(pair[0], Call::Tone(..)) && matches!(pair[1], Call::Tone(..))));
        }
        assert!(ctl.machine().is_halted());
        assert_eq!(bus.shutdown_complete.try_take(), Some(()));
    }
}
