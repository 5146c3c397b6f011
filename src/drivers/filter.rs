/// Estimate produced by [`AlphaBetaFilter`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterState {
    /// Filtered value (Pa for the pressure channel).
    pub position: f32,
    /// Rate of change of `position` per second.
    pub velocity: f32,
}

/// Fixed-gain (g-h) tracker of a value and its rate of change from
/// position-only measurements.
///
/// The recursion runs in f64: near 95 kPa one f32 step is about 8 mPa, which
/// swallows `velocity * dt` at 50 Hz and keeps the velocity from settling.
pub struct AlphaBetaFilter {
    alpha: f64,
    beta: f64,
    position: f64,
    velocity: f64,
    initialized: bool,
}

impl AlphaBetaFilter {
    pub fn new(alpha: f32, beta: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0) as f64,
            beta: beta as f64,
            position: 0.0,
            velocity: 0.0,
            initialized: false,
        }
    }

    /// Seeds the estimate with a first measurement and zero velocity.
    pub fn init(&mut self, measurement: f32) {
        self.position = measurement as f64;
        self.velocity = 0.0;
        self.initialized = true;
    }

    /// Runs one predict/correct step `dt` seconds after the previous one.
    ///
    /// The first call only seeds the state. A non-positive `dt` leaves the
    /// state untouched and returns `None`.
    pub fn filter(&mut self, measurement: f32, dt: f32) -> Option<f32> {
        if !self.initialized {
            self.init(measurement);
            return Some(measurement);
        }
        if !(dt > 0.0) {
            return None;
        }

        let dt = dt as f64;
        let predicted = self.position + self.velocity * dt;
        let residual = measurement as f64 - predicted;

        self.position = predicted + self.alpha * residual;
        self.velocity += self.beta * residual / dt;

        Some(self.position as f32)
    }

    pub fn state(&self) -> FilterState {
        FilterState {
            position: self.position as f32,
            velocity: self.velocity as f32,
        }
    }
}
