//! Sample acquisition: pulls readings from a pressure sensor and hands them to
//! the signal engine.

use embassy_time::{Duration, Instant, Timer};

use crate::bus::SampleLink;
use crate::drivers::ms5611::CONVERSION_MS;
use crate::state::RawSample;
use crate::ticks::tick_of;

/// Pause after a failed conversion before the next attempt.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(2 * CONVERSION_MS);

/// Source of compensated pressure (Pa) and temperature (0.01 °C) readings.
#[allow(async_fn_in_trait)]
pub trait PressureSensor {
    type Error;

    async fn measure(&mut self) -> Result<(u32, i32), Self::Error>;
}

/// Back-to-back conversions, each timestamped and handed to the engine.
///
/// A failed conversion is dropped and retried after [`RETRY_BACKOFF`], so a
/// dead bus never keeps the executor busy.
pub async fn acquire<S: PressureSensor>(sensor: &mut S, link: &SampleLink) -> ! {
    loop {
        match sensor.measure().await {
            Ok((pressure, temperature)) => {
                let sample = RawSample {
                    timestamp: tick_of(Instant::now()),
                    pressure,
                    temperature,
                };
                link.send(sample).await;
            }
            Err(_) => Timer::after(RETRY_BACKOFF).await,
        }
    }
}
