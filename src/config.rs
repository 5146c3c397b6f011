//! Tunables for the signal engine and the beep controller.

use core::fmt;

/// Number of altitude samples in the regression window.
pub const HISTORY_LEN: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    FilterGain,
    TickRate,
    LiftHysteresis,
    SinkHysteresis,
    ScaleRange,
    FrequencyRange,
    DurationRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::FilterGain => "filter gains must satisfy 0 < alpha <= 1 and beta > 0",
            ConfigError::TickRate => "tick rate must be non-zero",
            ConfigError::LiftHysteresis => "lift threshold must be above the lift-off threshold",
            ConfigError::SinkHysteresis => "sink threshold must be below the sink-off threshold",
            ConfigError::ScaleRange => "maximum lift must be positive and maximum sink negative",
            ConfigError::FrequencyRange => "tone frequencies must be positive and ordered",
            ConfigError::DurationRange => "beep and silence durations must be positive and ordered",
        };
        f.write_str(msg)
    }
}

// ── Signal engine ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalConfig {
    /// Position gain of the alpha-beta filter.
    pub alpha: f32,
    /// Velocity gain of the alpha-beta filter.
    pub beta: f32,
    /// Rate of the counter that stamps samples.
    pub tick_hz: u32,
}

impl SignalConfig {
    pub fn with_tick_hz(tick_hz: u32) -> Self {
        Self { tick_hz, ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) || !(self.beta > 0.0) {
            return Err(ConfigError::FilterGain);
        }
        if self.tick_hz == 0 {
            return Err(ConfigError::TickRate);
        }
        Ok(())
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            beta: 0.004,
            tick_hz: embassy_time::TICK_HZ as u32,
        }
    }
}

// ── Beep controller ───────────────────────────────────────────────────────────

/// Thresholds in m/s, frequencies in Hz, durations in ms.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BeepConfig {
    pub lift_threshold: f32,
    pub lift_off_threshold: f32,
    pub sink_threshold: f32,
    pub sink_off_threshold: f32,

    pub maximum_lift: f32,
    pub lift_freq_base: f32,
    pub lift_freq_max: f32,
    pub maximum_sink: f32,
    pub sink_freq_base: f32,
    pub sink_freq_min: f32,

    /// Tone-on length near zero climb.
    pub beep_duration_slow: f32,
    /// Tone-on length at `maximum_lift`.
    pub beep_duration_fast: f32,
    pub silence_duration_slow: f32,
    pub silence_duration_fast: f32,
}

impl Default for BeepConfig {
    fn default() -> Self {
        Self {
            lift_threshold: 0.6,
            lift_off_threshold: 0.2,
            sink_threshold: -1.0,
            sink_off_threshold: -0.6,

            maximum_lift: 6.0,
            lift_freq_base: 600.0,
            lift_freq_max: 1500.0,
            maximum_sink: -6.0,
            sink_freq_base: 400.0,
            sink_freq_min: 150.0,

            beep_duration_slow: 350.0,
            beep_duration_fast: 100.0,
            silence_duration_slow: 230.0,
            silence_duration_fast: 60.0,
        }
    }
}

impl BeepConfig {
    /// Checks the hysteresis bands and the mapping ranges.
    ///
    /// Each enter threshold must lie strictly further from zero than its
    /// matching off threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lift_threshold > self.lift_off_threshold) {
            return Err(ConfigError::LiftHysteresis);
        }
        if !(self.sink_threshold < self.sink_off_threshold) {
            return Err(ConfigError::SinkHysteresis);
        }
        if !(self.maximum_lift > 0.0) || !(self.maximum_sink < 0.0) {
            return Err(ConfigError::ScaleRange);
        }
        if !(self.lift_freq_base > 0.0 && self.lift_freq_max >= self.lift_freq_base)
            || !(self.sink_freq_min > 0.0 && self.sink_freq_base >= self.sink_freq_min)
        {
            return Err(ConfigError::FrequencyRange);
        }
        if !(self.beep_duration_fast > 0.0 && self.beep_duration_slow >= self.beep_duration_fast)
            || !(self.silence_duration_fast > 0.0
                && self.silence_duration_slow >= self.silence_duration_fast)
        {
            return Err(ConfigError::DurationRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SignalConfig::default().validate(), Ok(()));
        assert_eq!(BeepConfig::default().validate(), Ok(()));
    }

    #[test]
    fn collapsed_lift_band_rejected() {
        let cfg = BeepConfig { lift_off_threshold: 0.6, ..BeepConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::LiftHysteresis));
    }

    #[test]
    fn inverted_sink_band_rejected() {
        let cfg = BeepConfig { sink_threshold: -0.5, ..BeepConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::SinkHysteresis));
    }

    #[test]
    fn zero_silence_rejected() {
        let cfg = BeepConfig { silence_duration_fast: 0.0, ..BeepConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::DurationRange));
    }

    #[test]
    fn bad_gains_rejected() {
        let cfg = SignalConfig { beta: 0.0, ..SignalConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::FilterGain));
        assert_eq!(SignalConfig::with_tick_hz(0).validate(), Err(ConfigError::TickRate));
    }
}
