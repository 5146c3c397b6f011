//! Climb rate to tone parameters. All maps are piecewise linear and clamped.

use micromath::F32Ext;

use crate::config::BeepConfig;

/// PWM duty steps. Cycled by the button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Volume {
    Zero,
    Low,
    Medium,
    High,
}

impl Volume {
    pub const fn next(self) -> Self {
        match self {
            Volume::Zero => Volume::Low,
            Volume::Low => Volume::Medium,
            Volume::Medium => Volume::High,
            Volume::High => Volume::Zero,
        }
    }

    /// Duty cycle in hundredths of a percent.
    pub const fn duty_permyriad(self) -> u16 {
        match self {
            Volume::Zero => 0,
            Volume::Low => 200,
            Volume::Medium => 500,
            Volume::High => 5000,
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume::Medium
    }
}

/// Pitch while climbing: `lift_freq_base` at 0 m/s up to `lift_freq_max`.
pub fn lift_frequency(cfg: &BeepConfig, vario: f32) -> u32 {
    let v = vario.clamp(0.0, cfg.maximum_lift);
    (cfg.lift_freq_base + v / cfg.maximum_lift * (cfg.lift_freq_max - cfg.lift_freq_base)) as u32
}

/// Pitch while sinking: `sink_freq_base` at 0 m/s down to `sink_freq_min`.
pub fn sink_frequency(cfg: &BeepConfig, vario: f32) -> u32 {
    let v = vario.clamp(cfg.maximum_sink, 0.0);
    (cfg.sink_freq_base - v / cfg.maximum_sink * (cfg.sink_freq_base - cfg.sink_freq_min)) as u32
}

pub fn frequency(cfg: &BeepConfig, vario: f32) -> u32 {
    if vario >= 0.0 {
        lift_frequency(cfg, vario)
    } else {
        sink_frequency(cfg, vario)
    }
}

/// Tone-on length in ms, shrinking with |vario|.
pub fn beep_duration(cfg: &BeepConfig, vario: f32) -> u32 {
    let v = F32Ext::abs(vario).min(cfg.maximum_lift);
    let span = cfg.beep_duration_fast - cfg.beep_duration_slow;
    (cfg.beep_duration_slow + v / cfg.maximum_lift * span) as u32
}

/// Tone-off length in ms. Zero (continuous tone) unless climbing.
pub fn silence_duration(cfg: &BeepConfig, vario: f32) -> u32 {
    if vario <= 0.0 {
        return 0;
    }
    let v = vario.min(cfg.maximum_lift);
    let span = cfg.silence_duration_fast - cfg.silence_duration_slow;
    (cfg.silence_duration_slow + v / cfg.maximum_lift * span) as u32
}
