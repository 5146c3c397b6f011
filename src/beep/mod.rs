//! Audio feedback: climb rate to tone pitch and cadence.
//!
//! [`machine`] holds the pure hysteresis/pulse state machine, [`controller`]
//! executes its effects against the PWM output and the one-shot timer.

pub mod controller;
pub mod machine;
pub mod melody;
pub mod tone;

pub use controller::{BeepController, ToneOutput};
pub use machine::{BeepEvent, BeepMachine, ControlState, Effect, Effects, ToneState};
pub use tone::Volume;
